//! Vertex stream formats.
//!
//! These structs are consumed verbatim by the GPU vertex fetcher. Field order,
//! `#[repr(C)]` and the absence of padding are part of the renderer contract:
//!
//! ```text
//! QuadVertex (24 bytes)
//! ┌────────────────┬──────────────┬──────────────┐
//! │ position       │ color        │ uv           │
//! │ Float32x3      │ Unorm8x4     │ Float32x2    │
//! │ offset 0       │ offset 12    │ offset 16    │
//! └────────────────┴──────────────┴──────────────┘
//! ```

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rgba8, Vec2};

/// Attribute list + stride of one interleaved vertex stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: &'static [wgpu::VertexAttribute],
}

impl VertexLayout {
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: self.attributes,
        }
    }
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3], // z is always 0
    pub color: Rgba8,
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Unorm8x4,  // color
        2 => Float32x2  // uv
    ];

    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<QuadVertex>() as u64,
        attributes: &Self::ATTRS,
    };

    #[inline]
    pub fn new(position: Vec2, color: Rgba8, uv: Vec2) -> Self {
        Self {
            position: position.extend(),
            color,
            uv: uv.to_array(),
        }
    }
}

// ── extended vertex ───────────────────────────────────────────────────────

/// Vertex with four texture-coordinate channels (immediate batcher, extended mode).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ExtendedQuadVertex {
    pub position: [f32; 3],
    pub color: Rgba8,
    pub uv0: [f32; 2],
    pub uv1: [f32; 2],
    pub uv2: [f32; 2],
    pub uv3: [f32; 2],
}

impl ExtendedQuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Unorm8x4,
        2 => Float32x2,
        3 => Float32x2,
        4 => Float32x2,
        5 => Float32x2
    ];

    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<ExtendedQuadVertex>() as u64,
        attributes: &Self::ATTRS,
    };
}

// ── per-quad blocks ───────────────────────────────────────────────────────

/// The four vertices one item contributes to the stream.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadGeometry {
    pub vertices: [QuadVertex; 4],
}

/// The six indices one item contributes to the index buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct QuadIndices {
    pub indices: [u32; 6],
}

impl QuadIndices {
    /// Indices of the quad whose vertices start at `quad * 4`.
    #[inline]
    pub const fn for_quad(quad: u32) -> Self {
        let v0 = quad * 4;
        Self {
            indices: [v0, v0 + 1, v0 + 2, v0 + 2, v0 + 1, v0 + 3],
        }
    }
}

const _: () = assert!(std::mem::size_of::<QuadVertex>() == 24);
const _: () = assert!(std::mem::size_of::<ExtendedQuadVertex>() == 48);
const _: () = assert!(std::mem::size_of::<QuadGeometry>() == 4 * std::mem::size_of::<QuadVertex>());
const _: () = assert!(std::mem::size_of::<QuadIndices>() == 6 * std::mem::size_of::<u32>());
