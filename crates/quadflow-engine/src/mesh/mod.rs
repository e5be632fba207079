//! Vertex formats and the mesh buffers batches are written into.

mod buffer;
mod vertex;

pub use buffer::{Mesh, SubMesh};
pub use vertex::{ExtendedQuadVertex, QuadGeometry, QuadIndices, QuadVertex, VertexLayout};
