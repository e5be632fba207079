use bytemuck::Pod;

use super::vertex::VertexLayout;

/// Index range drawn with one topology.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SubMesh {
    pub index_start: u32,
    pub index_count: u32,
    pub topology: wgpu::PrimitiveTopology,
}

impl SubMesh {
    #[inline]
    pub const fn triangles(index_start: u32, index_count: u32) -> Self {
        Self {
            index_start,
            index_count,
            topology: wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

/// CPU-side vertex/index buffers handed to the rendering backend.
///
/// Vertices are stored as raw interleaved bytes described by [`layout`](Self::layout);
/// indices are always `u32`. Allocations are kept across [`clear`](Self::clear)
/// so a steady-state frame does not reallocate.
///
/// [`revision`](Self::revision) increases on every mutation, letting a backend
/// skip re-uploading an unchanged mesh.
#[derive(Debug, Default)]
pub struct Mesh {
    name: String,
    layout: Option<VertexLayout>,
    vertex_data: Vec<u8>,
    vertex_count: usize,
    indices: Vec<u32>,
    submeshes: Vec<SubMesh>,
    revision: u64,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drops all vertices, indices and sub-meshes.
    pub fn clear(&mut self) {
        self.layout = None;
        self.vertex_data.clear();
        self.vertex_count = 0;
        self.indices.clear();
        self.submeshes.clear();
        self.bump();
    }

    /// Replaces the vertex stream.
    ///
    /// # Panics
    /// Panics (debug only) if `layout.stride` differs from `size_of::<V>()`.
    pub fn set_vertex_buffer<V: Pod>(&mut self, vertices: &[V], layout: VertexLayout) {
        debug_assert_eq!(
            layout.stride as usize,
            std::mem::size_of::<V>(),
            "vertex layout stride does not match vertex type"
        );
        self.vertex_data.clear();
        self.vertex_data.extend_from_slice(bytemuck::cast_slice(vertices));
        self.vertex_count = vertices.len();
        self.layout = Some(layout);
        self.bump();
    }

    /// Replaces the index stream.
    pub fn set_index_buffer(&mut self, indices: &[u32]) {
        self.indices.clear();
        self.indices.extend_from_slice(indices);
        self.bump();
    }

    /// Replaces all sub-meshes with `submesh`.
    pub fn set_submesh(&mut self, submesh: SubMesh) {
        debug_assert!(
            (submesh.index_start as usize + submesh.index_count as usize) <= self.indices.len(),
            "sub-mesh range exceeds index buffer"
        );
        self.submeshes.clear();
        self.submeshes.push(submesh);
        self.bump();
    }

    #[inline]
    pub fn layout(&self) -> Option<VertexLayout> {
        self.layout
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0 && self.indices.is_empty()
    }

    #[inline]
    pub fn index_format(&self) -> wgpu::IndexFormat {
        wgpu::IndexFormat::Uint32
    }

    /// Raw vertex bytes, ready for `Queue::write_buffer`.
    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertex_data
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw index bytes, ready for `Queue::write_buffer`.
    #[inline]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    #[inline]
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Decodes the vertex stream as `V`.
    ///
    /// Returns `None` if `V`'s size does not match the stored layout.
    pub fn read_vertices<V: Pod>(&self) -> Option<Vec<V>> {
        let layout = self.layout?;
        let size = std::mem::size_of::<V>();
        if layout.stride as usize != size {
            return None;
        }
        Some(
            self.vertex_data
                .chunks_exact(size)
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    #[inline]
    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
