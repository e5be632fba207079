//! Turning item collections into quad meshes.
//!
//! Two paths share the same vertex format and transform order:
//! - [`BatchPipeline`]: parallel, split into start/finalize around other frame work
//! - [`ImmediateBatcher`]: single-threaded draw calls flushed by `complete_mesh`

mod immediate;
mod pipeline;
mod renderable;
mod setup;

pub use immediate::{BatcherConfig, ImmediateBatcher, MeshColors, MeshPart};
pub use pipeline::{degenerate_quad, item_quad, BatchPipeline, ChunkSizes, SharedItems};
pub use renderable::Renderable;
pub use setup::{BatchRenderSetup, MaterialBinding, SetupConfig};
