use crate::coords::ColorRgba;
use crate::mesh::Mesh;
use crate::sprite::{SpriteSource, SpriteTable, TextureId};

/// Initialization parameters for a batch render target.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    /// Debug name of the destination mesh.
    pub mesh_name: String,

    /// Tint multiplied into every vertex color by the material.
    pub tint: ColorRgba,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            mesh_name: "sprite batch".to_owned(),
            tint: ColorRgba::WHITE,
        }
    }
}

/// What a backend binds when drawing the batch mesh.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialBinding {
    /// Texture page of the sprite table; `None` draws untextured.
    pub texture: Option<TextureId>,
    pub tint: ColorRgba,
}

/// Sprite table, destination mesh and material for one batched draw.
///
/// Created with [`init`](Self::init) and torn down with
/// [`shutdown`](Self::shutdown), which also runs on drop.
#[derive(Debug)]
pub struct BatchRenderSetup {
    sprites: SpriteTable,
    mesh: Mesh,
    tint: ColorRgba,
    initialized: bool,
}

impl BatchRenderSetup {
    pub fn init(config: SetupConfig, sources: &[SpriteSource]) -> Self {
        let sprites = SpriteTable::build(sources);
        log::info!(
            "batch render setup '{}': {} sprites, texture {:?}",
            config.mesh_name,
            sprites.len(),
            sprites.texture()
        );
        Self {
            sprites,
            mesh: Mesh::new(config.mesh_name),
            tint: config.tint,
            initialized: true,
        }
    }

    #[inline]
    pub fn sprites(&self) -> &SpriteTable {
        &self.sprites
    }

    /// Rebuilds the sprite table in place (e.g. after the atlas changed).
    pub fn rebuild_sprites(&mut self, sources: &[SpriteSource]) {
        self.sprites.rebuild(sources);
    }

    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[inline]
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    /// Borrows the sprite table and the mesh together.
    #[inline]
    pub fn parts_mut(&mut self) -> (&SpriteTable, &mut Mesh) {
        (&self.sprites, &mut self.mesh)
    }

    pub fn material(&self) -> MaterialBinding {
        MaterialBinding {
            texture: self.sprites.texture(),
            tint: self.tint,
        }
    }

    pub fn set_tint(&mut self, tint: ColorRgba) {
        self.tint = tint;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Releases the sprite table and mesh storage. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        self.sprites = SpriteTable::empty();
        self.mesh = Mesh::new(self.mesh.name().to_owned());
        log::debug!("batch render setup '{}' shut down", self.mesh.name());
    }
}

impl Drop for BatchRenderSetup {
    fn drop(&mut self) {
        self.shutdown();
    }
}
