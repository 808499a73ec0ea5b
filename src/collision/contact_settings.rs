#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// How the material coefficients of two touching bodies are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum MaterialCoefficientMixing {
    TakeMaximum,
    TakeMinimum,
    #[default]
    UseAverage,
}

impl MaterialCoefficientMixing {
    /// Combines one coefficient from each body
    pub fn mix(self, a: f32, b: f32) -> f32 {
        match self {
            MaterialCoefficientMixing::TakeMaximum => a.max(b),
            MaterialCoefficientMixing::TakeMinimum => a.min(b),
            MaterialCoefficientMixing::UseAverage => (a + b) * 0.5,
        }
    }
}

/// Tuning values handed to every contact when it is (re)initialized
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ContactSettings {
    /// Upper bound of the velocity used to push penetrating bodies apart
    pub maximum_bias: f32,
    /// Fraction of the penetration corrected per second
    pub bias_factor: f32,
    /// Relative speed below which a contact is not iterated
    pub minimum_velocity: f32,
    /// Penetration tolerated before correction starts
    pub allowed_penetration: f32,
    /// Distance at which a cached contact point breaks
    pub break_threshold: f32,
    pub mixing: MaterialCoefficientMixing,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            maximum_bias: 10.0,
            bias_factor: 0.25,
            minimum_velocity: 0.001,
            allowed_penetration: 0.01,
            break_threshold: 0.01,
            mixing: MaterialCoefficientMixing::UseAverage,
        }
    }
}

impl ContactSettings {
    /// Builder style override of the mixing mode
    pub fn with_mixing(mut self, mixing: MaterialCoefficientMixing) -> Self {
        self.mixing = mixing;
        self
    }
}
