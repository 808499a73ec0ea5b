use crate::math::{Aabb, Vector3};

/// Sink for debug geometry. The engine never renders on its own; bodies,
/// contacts and constraints describe themselves through this interface.
pub trait DebugDrawer {
    /// Draws a line segment
    fn draw_line(&mut self, start: Vector3, end: Vector3);

    /// Draws a filled or wireframe triangle
    fn draw_triangle(&mut self, a: Vector3, b: Vector3, c: Vector3);

    /// Draws a single point
    fn draw_point(&mut self, point: Vector3);

    /// Draws a box outline. The default emits the twelve edges as lines.
    fn draw_aabb(&mut self, aabb: &Aabb) {
        let c = aabb.corners();
        const EDGES: [(usize, usize); 12] = [
            (0, 1), (1, 2), (2, 3), (3, 0),
            (4, 5), (5, 6), (6, 7), (7, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];
        for (a, b) in EDGES {
            self.draw_line(c[a], c[b]);
        }
    }
}
