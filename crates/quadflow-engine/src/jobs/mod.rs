//! Minimal job system on top of the rayon worker pool.
//!
//! Jobs are ordinary closures gated on a [`JobHandle`]. A job whose dependency
//! is still running is parked as a continuation and spawned by whichever thread
//! completes the dependency, so workers never block waiting on each other.
//! The only blocking calls are [`JobHandle::complete`] and [`Job::complete`].

mod handle;
mod job;

pub use handle::JobHandle;
pub use job::{schedule, schedule_with_output, Job, JobError};
