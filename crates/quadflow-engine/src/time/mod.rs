//! Frame timing.
//!
//! One [`FrameClock`] per loop; call `tick()` once per frame to get the delta
//! the simulation and batching stages should use.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
