//! 2D affine helpers used by every batching path.
//!
//! The composition order is fixed: scale, then rotate, then translate. Changing
//! it changes what ends up on screen.

mod transform;

pub use transform::{calculate_position, calculate_position_sin_cos, Rotation, Transform2d};
