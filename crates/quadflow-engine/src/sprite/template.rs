use crate::coords::Vec2;

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

pub const TOP_LEFT: usize = 0;
pub const TOP_RIGHT: usize = 1;
pub const BOTTOM_LEFT: usize = 2;
pub const BOTTOM_RIGHT: usize = 3;

/// Local-space quad of one sprite: corner positions and texture coordinates.
///
/// Corners are ordered top-left, top-right, bottom-left, bottom-right.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteQuadTemplate {
    vertices: [Vec2; VERTICES_PER_QUAD],
    uvs: [Vec2; VERTICES_PER_QUAD],
    width: f32,
    height: f32,
}

impl SpriteQuadTemplate {
    /// Unit quad spanning `[-0.5, 0.5]` with full-texture UVs.
    ///
    /// Stand-in for sprites that cannot be batched.
    pub const UNIT: SpriteQuadTemplate = SpriteQuadTemplate {
        vertices: [
            Vec2::new(-0.5, 0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
        ],
        uvs: [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
        ],
        width: 1.0,
        height: 1.0,
    };

    pub fn new(vertices: [Vec2; VERTICES_PER_QUAD], uvs: [Vec2; VERTICES_PER_QUAD]) -> Self {
        Self {
            width: vertices[TOP_LEFT].distance_to(vertices[TOP_RIGHT]),
            height: vertices[TOP_LEFT].distance_to(vertices[BOTTOM_LEFT]),
            vertices,
            uvs,
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2; VERTICES_PER_QUAD] {
        &self.vertices
    }

    #[inline]
    pub fn uvs(&self) -> &[Vec2; VERTICES_PER_QUAD] {
        &self.uvs
    }

    /// Distance between the two top corners.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Distance between the two left corners.
    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }
}

impl Default for SpriteQuadTemplate {
    fn default() -> Self {
        Self::UNIT
    }
}
