use crate::coords::{ColorRgba, Vec2};

/// Read-only view of an item the batch pipeline can turn into a quad.
///
/// Implement it on whatever struct the application simulates (particles,
/// bullets, tiles). The pipeline is generic over the implementor, so calls are
/// statically dispatched in the parallel loop.
pub trait Renderable {
    /// Invisible items still occupy their slot as a degenerate quad.
    fn is_visible(&self) -> bool;

    /// Index into the sprite table the batch was started with.
    fn sprite_index(&self) -> i32;

    fn position(&self) -> Vec2;

    fn scale(&self) -> Vec2;

    /// Radians, counter-clockwise.
    fn rotation_angle(&self) -> f32;

    fn color(&self) -> ColorRgba;
}
