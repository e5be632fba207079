//! Sprite templates and the table batches read them from.

mod quad;
mod source;
mod table;
mod template;

pub use quad::{SpriteQuad, UvChannel};
pub use source::{PackingMode, SpriteSource, TextureId, QUAD_TRIANGLES};
pub use table::{template_at, SpriteTable, SpriteTemplates};
pub use template::{
    SpriteQuadTemplate, BOTTOM_LEFT, BOTTOM_RIGHT, INDICES_PER_QUAD, TOP_LEFT, TOP_RIGHT,
    VERTICES_PER_QUAD,
};
