//! Coordinate and color types shared by the geometry, sprite and batch modules.
//!
//! Space conventions:
//! - sprite-local units (a unit quad spans `[-0.5, 0.5]`)
//! - +X right, +Y up, positive angles rotate counter-clockwise
//!
//! Projection to clip space is the rendering backend's concern.

mod color;
mod vec2;

pub use color::{ColorRgba, Rgba8};
pub use vec2::Vec2;
