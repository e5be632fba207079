use std::sync::Arc;

use crate::coords::Vec2;

use super::source::{PackingMode, SpriteSource, TextureId, QUAD_TRIANGLES};
use super::template::{SpriteQuadTemplate, VERTICES_PER_QUAD};

/// Shared, immutable template storage.
///
/// Batches clone this handle when they start, so rebuilding a table never
/// touches templates an in-flight batch is reading.
pub type SpriteTemplates = Arc<[SpriteQuadTemplate]>;

/// Looks up a template by signed sprite index.
///
/// Negative and out-of-range indices yield `None`.
#[inline]
pub fn template_at(templates: &[SpriteQuadTemplate], index: i32) -> Option<&SpriteQuadTemplate> {
    usize::try_from(index).ok().and_then(|i| templates.get(i))
}

/// Indexed set of quad templates sharing one texture page.
///
/// Index `i` always corresponds to the `i`-th source passed to [`build`](Self::build);
/// sprites that fail validation keep their slot with a unit-quad placeholder.
#[derive(Debug, Clone)]
pub struct SpriteTable {
    templates: SpriteTemplates,
    names: Vec<String>,
    texture: Option<TextureId>,
}

impl SpriteTable {
    /// Empty table without a texture page.
    pub fn empty() -> Self {
        Self {
            templates: Arc::from(Vec::new()),
            names: Vec::new(),
            texture: None,
        }
    }

    pub fn build(sources: &[SpriteSource]) -> Self {
        let mut table = Self::empty();
        table.rebuild(sources);
        table
    }

    /// Replaces the table's contents with templates built from `sources`.
    ///
    /// The previous storage is released first. Batches that already hold a
    /// [`SpriteTemplates`] handle keep their snapshot alive until they finish.
    pub fn rebuild(&mut self, sources: &[SpriteSource]) {
        self.templates = Arc::from(Vec::new());
        self.names.clear();

        self.texture = sources.first().map(|s| s.texture);

        let mut templates = Vec::with_capacity(sources.len());
        let mut rejected = 0usize;

        for source in sources {
            if let Some(texture) = self.texture
                && source.texture != texture
            {
                log::error!(
                    "sprite '{}' uses texture {:?} which differs from the first sprite texture {:?}; \
                     all sprites must belong to the same atlas page",
                    source.name,
                    source.texture,
                    texture
                );
            }

            match validated_template(source) {
                Some(template) => templates.push(template),
                None => {
                    rejected += 1;
                    templates.push(SpriteQuadTemplate::UNIT);
                }
            }

            self.names.push(source.name.clone());
        }

        log::debug!(
            "sprite table built: {} templates ({} replaced by unit quads)",
            templates.len(),
            rejected
        );

        self.templates = Arc::from(templates);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    #[inline]
    pub fn get(&self, index: i32) -> Option<&SpriteQuadTemplate> {
        template_at(&self.templates, index)
    }

    /// Shared handle to the template storage.
    #[inline]
    pub fn templates(&self) -> SpriteTemplates {
        Arc::clone(&self.templates)
    }

    /// Texture page of the first sprite, or `None` for an empty table.
    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Finds a sprite's index by name.
    pub fn index_of(&self, name: &str) -> Option<i32> {
        let found = self
            .names
            .iter()
            .position(|n| n == name)
            .and_then(|i| i32::try_from(i).ok());
        if found.is_none() {
            log::error!("failed to find sprite '{name}' in sprite table");
        }
        found
    }

    #[inline]
    pub fn name(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }
}

impl Default for SpriteTable {
    fn default() -> Self {
        Self::empty()
    }
}

fn validated_template(source: &SpriteSource) -> Option<SpriteQuadTemplate> {
    if source.packing != PackingMode::Rectangle {
        log::error!(
            "sprite '{}' is tightly packed; only rectangle packing is supported for sprite batching",
            source.name
        );
        return None;
    }

    let (Ok(vertices), Ok(uvs)) = (
        <[Vec2; VERTICES_PER_QUAD]>::try_from(source.vertices.as_slice()),
        <[Vec2; VERTICES_PER_QUAD]>::try_from(source.uvs.as_slice()),
    ) else {
        log::error!(
            "sprite '{}' has {} vertices and {} uvs; quads need exactly {}",
            source.name,
            source.vertices.len(),
            source.uvs.len(),
            VERTICES_PER_QUAD
        );
        return None;
    };

    if source.triangles != QUAD_TRIANGLES {
        log::warn!(
            "sprite '{}' has unexpected index data {:?}; batches always use {:?}",
            source.name,
            source.triangles,
            QUAD_TRIANGLES
        );
    }

    Some(SpriteQuadTemplate::new(vertices, uvs))
}
