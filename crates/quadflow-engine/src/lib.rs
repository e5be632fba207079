//! Quadflow engine crate.
//!
//! Turns large collections of 2D sprites into one interleaved vertex/index
//! mesh per frame, either in parallel on the rayon pool ([`batch::BatchPipeline`])
//! or through immediate draw calls ([`batch::ImmediateBatcher`]). Uploading and
//! drawing the resulting [`mesh::Mesh`] is left to the rendering backend.

pub mod batch;
pub mod coords;
pub mod geometry;
pub mod jobs;
pub mod mesh;
pub mod sprite;
pub mod time;

pub mod logging;
