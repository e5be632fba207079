use crate::coords::Vec2;

/// Opaque identity of a texture page owned by the rendering backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// How a sprite's geometry was packed into its texture page.
///
/// Only [`PackingMode::Rectangle`] sprites can be batched as quads.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PackingMode {
    Rectangle,
    Tight,
}

/// Quad triangle list: `0 1 2` then `2 1 3`.
///
/// ```text
/// 0---1
/// |  /|
/// | / |
/// |/  |
/// 2---3
/// ```
pub const QUAD_TRIANGLES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Sprite description as delivered by the asset layer.
///
/// Loading and UV extraction happen elsewhere; this is only the hand-off
/// contract. A well-formed batchable sprite has exactly 4 vertices, 4 UVs,
/// [`QUAD_TRIANGLES`] and rectangle packing.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSource {
    pub name: String,
    pub vertices: Vec<Vec2>,
    pub uvs: Vec<Vec2>,
    pub triangles: Vec<u16>,
    pub packing: PackingMode,
    pub texture: TextureId,
}

impl SpriteSource {
    /// Builds a rectangle-packed sprite centered on the origin.
    ///
    /// `uv_min`/`uv_max` are the bottom-left and top-right corners of the
    /// sprite's region in its texture page.
    pub fn rect(
        name: impl Into<String>,
        size: Vec2,
        uv_min: Vec2,
        uv_max: Vec2,
        texture: TextureId,
    ) -> Self {
        let half = size * 0.5;
        Self {
            name: name.into(),
            vertices: vec![
                Vec2::new(-half.x, half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(-half.x, -half.y),
                Vec2::new(half.x, -half.y),
            ],
            uvs: vec![
                Vec2::new(uv_min.x, uv_max.y),
                Vec2::new(uv_max.x, uv_max.y),
                Vec2::new(uv_min.x, uv_min.y),
                Vec2::new(uv_max.x, uv_min.y),
            ],
            triangles: QUAD_TRIANGLES.to_vec(),
            packing: PackingMode::Rectangle,
            texture,
        }
    }
}
