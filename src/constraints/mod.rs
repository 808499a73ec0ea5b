mod constraint;
mod point_on_point;
mod single_body;

pub use self::constraint::Constraint;
pub use self::point_on_point::PointOnPoint;
pub use self::single_body::SingleBodyPointOnPoint;
