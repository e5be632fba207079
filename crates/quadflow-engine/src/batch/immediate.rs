use crate::coords::{ColorRgba, Rgba8, Vec2};
use crate::geometry::Transform2d;
use crate::mesh::{ExtendedQuadVertex, Mesh, QuadVertex, SubMesh};
use crate::sprite::{template_at, SpriteQuad, SpriteTemplates, QUAD_TRIANGLES, VERTICES_PER_QUAD};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Emit [`ExtendedQuadVertex`] (uv0..uv3) instead of [`QuadVertex`].
    pub extended_uv_channels: bool,
    /// Vertices reserved up front; indices get 1.5x this.
    pub initial_capacity: usize,
}

impl BatcherConfig {
    pub const DEFAULT_CAPACITY: usize = 4096;
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            extended_uv_channels: false,
            initial_capacity: Self::DEFAULT_CAPACITY,
        }
    }
}

/// Vertex colors of a [`MeshPart`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MeshColors<'a> {
    PerVertex(&'a [ColorRgba]),
    Uniform(ColorRgba),
}

/// Arbitrary indexed geometry for [`ImmediateBatcher::draw_mesh`].
///
/// `triangles` index into `vertices` (0-based within the part).
#[derive(Debug, Copy, Clone)]
pub struct MeshPart<'a> {
    pub vertices: &'a [Vec2],
    pub uv0: &'a [Vec2],
    pub colors: MeshColors<'a>,
    pub triangles: &'a [u32],
    /// uv1..uv3; only written when the batcher runs with extended channels.
    pub extra_uvs: [Option<&'a [Vec2]>; 3],
}

impl<'a> MeshPart<'a> {
    pub fn new(vertices: &'a [Vec2], uv0: &'a [Vec2], colors: MeshColors<'a>, triangles: &'a [u32]) -> Self {
        Self {
            vertices,
            uv0,
            colors,
            triangles,
            extra_uvs: [None; 3],
        }
    }
}

/// Single-threaded accumulator: draw calls append geometry, [`complete_mesh`]
/// flushes it into a [`Mesh`] in one go.
///
/// Lists keep their capacity across frames.
///
/// [`complete_mesh`]: Self::complete_mesh
pub struct ImmediateBatcher {
    sprites: SpriteTemplates,
    extended: bool,

    positions: Vec<Vec2>,
    uv0: Vec<Vec2>,
    extra_uvs: [Vec<Vec2>; 3],
    colors: Vec<Rgba8>,
    indices: Vec<u32>,
    index_offset: u32,
}

impl ImmediateBatcher {
    pub fn new(sprites: SpriteTemplates, config: BatcherConfig) -> Self {
        let vertices = config.initial_capacity;
        let indices = vertices + vertices / 2;
        let extra_capacity = if config.extended_uv_channels { vertices } else { 0 };

        Self {
            sprites,
            extended: config.extended_uv_channels,
            positions: Vec::with_capacity(vertices),
            uv0: Vec::with_capacity(vertices),
            extra_uvs: std::array::from_fn(|_| Vec::with_capacity(extra_capacity)),
            colors: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            index_offset: 0,
        }
    }

    /// Rebinds the batcher to a rebuilt sprite table.
    pub fn set_sprites(&mut self, sprites: SpriteTemplates) {
        self.sprites = sprites;
    }

    #[inline]
    pub fn extended_uv_channels(&self) -> bool {
        self.extended
    }

    /// Nothing has been drawn since the last [`complete_mesh`](Self::complete_mesh).
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.positions.is_empty() && self.indices.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Appends sprite `index` placed by `placement` (scale, rotate, translate).
    pub fn draw_sprite(&mut self, index: i32, placement: &Transform2d, color: ColorRgba) {
        let Some(template) = template_at(&self.sprites, index) else {
            log::error!(
                "draw_sprite: sprite index {index} out of range (table has {})",
                self.sprites.len()
            );
            return;
        };
        let Some(base) = self.reserve_vertices(VERTICES_PER_QUAD) else {
            return;
        };

        let color = color.to_rgba8();
        self.positions
            .extend(template.vertices().iter().map(|&v| placement.apply(v)));
        self.uv0.extend_from_slice(template.uvs());
        self.colors.extend(std::iter::repeat_n(color, VERTICES_PER_QUAD));
        if self.extended {
            for channel in &mut self.extra_uvs {
                channel.extend(std::iter::repeat_n(Vec2::ZERO, VERTICES_PER_QUAD));
            }
        }

        self.push_quad_indices(base);
    }

    /// Appends a hand-edited quad with its per-vertex colors and UV channels.
    pub fn draw_sprite_quad(&mut self, quad: &SpriteQuad) {
        let Some(base) = self.reserve_vertices(VERTICES_PER_QUAD) else {
            return;
        };

        self.positions.extend_from_slice(&quad.vertices);
        self.uv0.extend_from_slice(&quad.uv0);
        self.colors.extend(quad.colors.iter().map(|c| c.to_rgba8()));
        if self.extended {
            for (dst, src) in self.extra_uvs.iter_mut().zip(&quad.extra_uvs) {
                dst.extend_from_slice(src);
            }
        }

        self.push_quad_indices(base);
    }

    /// Appends arbitrary triangles.
    ///
    /// Empty parts are ignored. Parts whose attribute lengths disagree, whose
    /// triangle list is not a multiple of 3 or indexes past its vertices are
    /// rejected with an error.
    pub fn draw_mesh(&mut self, part: &MeshPart<'_>) {
        let n = part.vertices.len();
        if n == 0 || part.triangles.is_empty() {
            return;
        }

        if part.uv0.len() != n {
            log::error!("draw_mesh: {} uvs for {n} vertices", part.uv0.len());
            return;
        }
        if let MeshColors::PerVertex(colors) = part.colors
            && colors.len() != n
        {
            log::error!("draw_mesh: {} colors for {n} vertices", colors.len());
            return;
        }
        if let Some(bad) = part.extra_uvs.iter().flatten().find(|uvs| uvs.len() != n) {
            log::error!("draw_mesh: extra uv channel has {} entries for {n} vertices", bad.len());
            return;
        }
        if part.triangles.len() % 3 != 0 {
            log::error!("draw_mesh: triangle list length {} is not a multiple of 3", part.triangles.len());
            return;
        }
        if let Some(&bad) = part.triangles.iter().find(|&&i| i as usize >= n) {
            log::error!("draw_mesh: triangle index {bad} out of range for {n} vertices");
            return;
        }

        let Some(base) = self.reserve_vertices(n) else {
            return;
        };

        self.positions.extend_from_slice(part.vertices);
        self.uv0.extend_from_slice(part.uv0);
        match part.colors {
            MeshColors::PerVertex(colors) => self.colors.extend(colors.iter().map(|c| c.to_rgba8())),
            MeshColors::Uniform(color) => self.colors.extend(std::iter::repeat_n(color.to_rgba8(), n)),
        }
        if self.extended {
            for (dst, src) in self.extra_uvs.iter_mut().zip(&part.extra_uvs) {
                match src {
                    Some(uvs) => dst.extend_from_slice(uvs),
                    None => dst.extend(std::iter::repeat_n(Vec2::ZERO, n)),
                }
            }
        }

        self.indices.extend(part.triangles.iter().map(|&i| base + i));
        self.index_offset = base + n as u32;
    }

    /// Writes everything drawn so far into `mesh` and resets the batcher.
    ///
    /// With nothing drawn, a mesh that still holds content is cleared and an
    /// already-empty one is left untouched.
    pub fn complete_mesh(&mut self, mesh: &mut Mesh) {
        if self.is_complete() {
            if !mesh.is_empty() || !mesh.submeshes().is_empty() {
                mesh.clear();
            }
            return;
        }

        mesh.clear();

        if self.extended {
            let vertices: Vec<ExtendedQuadVertex> = (0..self.positions.len())
                .map(|i| ExtendedQuadVertex {
                    position: self.positions[i].extend(),
                    color: self.colors[i],
                    uv0: self.uv0[i].to_array(),
                    uv1: self.extra_uvs[0][i].to_array(),
                    uv2: self.extra_uvs[1][i].to_array(),
                    uv3: self.extra_uvs[2][i].to_array(),
                })
                .collect();
            mesh.set_vertex_buffer(&vertices, ExtendedQuadVertex::LAYOUT);
        } else {
            let vertices: Vec<QuadVertex> = self
                .positions
                .iter()
                .zip(&self.colors)
                .zip(&self.uv0)
                .map(|((&p, &c), &uv)| QuadVertex::new(p, c, uv))
                .collect();
            mesh.set_vertex_buffer(&vertices, QuadVertex::LAYOUT);
        }

        mesh.set_index_buffer(&self.indices);
        mesh.set_submesh(SubMesh::triangles(0, self.indices.len() as u32));

        log::trace!(
            "immediate batch: {} vertices, {} indices",
            self.positions.len(),
            self.indices.len()
        );
        self.clear();
    }

    /// Drops everything drawn since the last flush.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.uv0.clear();
        self.extra_uvs.iter_mut().for_each(Vec::clear);
        self.colors.clear();
        self.indices.clear();
        self.index_offset = 0;
    }

    /// Base index for `count` new vertices, or `None` if the u32 index space is exhausted.
    fn reserve_vertices(&self, count: usize) -> Option<u32> {
        let fits = u32::try_from(count)
            .ok()
            .and_then(|c| self.index_offset.checked_add(c))
            .is_some();
        if !fits {
            log::error!("immediate batcher: u32 index space exhausted, dropping {count} vertices");
            return None;
        }
        Some(self.index_offset)
    }

    fn push_quad_indices(&mut self, base: u32) {
        self.indices
            .extend(QUAD_TRIANGLES.iter().map(|&i| base + u32::from(i)));
        self.index_offset = base + VERTICES_PER_QUAD as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::{SpriteSource, SpriteTable, TextureId, UvChannel};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn table() -> SpriteTable {
        SpriteTable::build(&[
            SpriteSource::rect("unit", Vec2::ONE, Vec2::ZERO, Vec2::ONE, TextureId(1)),
            SpriteSource::rect(
                "wide",
                Vec2::new(4.0, 2.0),
                Vec2::new(0.5, 0.0),
                Vec2::new(1.0, 0.5),
                TextureId(1),
            ),
        ])
    }

    fn batcher(extended: bool) -> ImmediateBatcher {
        ImmediateBatcher::new(
            table().templates(),
            BatcherConfig {
                extended_uv_channels: extended,
                initial_capacity: 16,
            },
        )
    }

    // ── draw_sprite ───────────────────────────────────────────────────────

    #[test]
    fn sprites_append_quads_with_running_offset() {
        let mut b = batcher(false);
        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);
        b.draw_sprite(1, &Transform2d::at(Vec2::new(1.0, 1.0)), ColorRgba::RED);

        assert_eq!(b.vertex_count(), 8);
        assert_eq!(b.index_count(), 12);

        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);

        assert_eq!(mesh.indices(), &[0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]);
        assert_eq!(mesh.submeshes(), &[SubMesh::triangles(0, 12)]);
        assert_eq!(mesh.layout(), Some(QuadVertex::LAYOUT));

        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        assert_eq!(v[4].position, [-1.0, 2.0, 0.0]);
        assert_eq!(v[4].uv, [0.5, 0.5]);
        assert_eq!(v[4].color, Rgba8::new(255, 0, 0, 255));
    }

    #[test]
    fn sprite_placement_scales_before_rotating() {
        let mut b = batcher(false);
        let placement = Transform2d::at(Vec2::new(10.0, 0.0))
            .with_rotation(FRAC_PI_2)
            .with_scale(Vec2::new(2.0, 1.0));
        b.draw_sprite(0, &placement, ColorRgba::WHITE);

        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);
        let v = mesh.read_vertices::<QuadVertex>().unwrap();

        // TR (0.5, 0.5) -> scaled (1.0, 0.5) -> rotated (-0.5, 1.0) -> moved
        assert_relative_eq!(v[1].position[0], 9.5, epsilon = 1e-5);
        assert_relative_eq!(v[1].position[1], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn invalid_sprite_index_is_ignored() {
        let mut b = batcher(false);
        b.draw_sprite(-1, &Transform2d::IDENTITY, ColorRgba::WHITE);
        assert!(b.is_complete());

        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);
        let (vertices, indices) = (b.vertex_count(), b.index_count());

        let len = table().len() as i32;
        b.draw_sprite(-1, &Transform2d::IDENTITY, ColorRgba::WHITE);
        b.draw_sprite(len, &Transform2d::IDENTITY, ColorRgba::WHITE);
        assert_eq!(b.vertex_count(), vertices);
        assert_eq!(b.index_count(), indices);

        // the next valid sprite continues from the same offset
        b.draw_sprite(1, &Transform2d::IDENTITY, ColorRgba::WHITE);
        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);
        assert_eq!(mesh.indices(), &[0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]);
    }

    #[test]
    fn set_sprites_rebinds_table() {
        let mut b = batcher(false);
        b.set_sprites(SpriteTable::empty().templates());
        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);
        assert!(b.is_complete());
    }

    // ── complete_mesh ─────────────────────────────────────────────────────

    #[test]
    fn complete_resets_batcher() {
        let mut b = batcher(false);
        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);
        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);

        assert!(b.is_complete());
        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);
        b.complete_mesh(&mut mesh);
        assert_eq!(mesh.indices(), &[0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn empty_complete_leaves_empty_mesh_untouched() {
        let mut b = batcher(false);
        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);
        b.complete_mesh(&mut mesh);
        assert_eq!(mesh.revision(), 0);
    }

    #[test]
    fn empty_complete_clears_stale_mesh() {
        let mut b = batcher(false);
        let mut mesh = Mesh::new("immediate");
        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);
        b.complete_mesh(&mut mesh);
        assert!(!mesh.is_empty());

        b.complete_mesh(&mut mesh);
        assert!(mesh.is_empty());
        assert!(mesh.submeshes().is_empty());

        let revision = mesh.revision();
        b.complete_mesh(&mut mesh);
        assert_eq!(mesh.revision(), revision);
    }

    // ── extended channels ─────────────────────────────────────────────────

    #[test]
    fn extended_layout_carries_extra_uvs() {
        let mut b = batcher(true);
        let mut quad = SpriteQuad::new();
        quad.set_uniform_uv(UvChannel::Uv2, Vec2::new(0.25, 0.75));
        b.draw_sprite_quad(&quad);
        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);

        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);

        assert_eq!(mesh.layout(), Some(ExtendedQuadVertex::LAYOUT));
        assert_eq!(mesh.vertex_bytes().len(), 8 * 48);

        let v = mesh.read_vertices::<ExtendedQuadVertex>().unwrap();
        assert_eq!(v[0].uv2, [0.25, 0.75]);
        assert_eq!(v[0].uv1, [0.0, 1.0]);
        // sprites drawn by index get zero extra channels
        assert!(v[4..].iter().all(|x| x.uv1 == [0.0; 2] && x.uv2 == [0.0; 2] && x.uv3 == [0.0; 2]));
    }

    #[test]
    fn sprite_quad_keeps_per_vertex_colors() {
        let mut b = batcher(false);
        let mut quad = SpriteQuad::new();
        quad.from_to(Vec2::ZERO, Vec2::new(0.0, 3.0));
        quad.set_alpha_from_to(1.0, 0.0);
        b.draw_sprite_quad(&quad);

        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);
        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        assert_eq!(v[0].color.a, 0);
        assert_eq!(v[2].color.a, 255);
        assert_relative_eq!(v[0].position[1], 3.0);
    }

    // ── draw_mesh ─────────────────────────────────────────────────────────

    #[test]
    fn mesh_part_is_offset_after_sprites() {
        let mut b = batcher(true);
        b.draw_sprite(0, &Transform2d::IDENTITY, ColorRgba::WHITE);

        let verts = [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let uvs = [Vec2::ZERO; 3];
        let uv3 = [Vec2::ONE; 3];
        let mut part = MeshPart::new(&verts, &uvs, MeshColors::Uniform(ColorRgba::BLUE), &[0, 1, 2]);
        part.extra_uvs[2] = Some(&uv3);
        b.draw_mesh(&part);

        let mut mesh = Mesh::new("immediate");
        b.complete_mesh(&mut mesh);
        assert_eq!(&mesh.indices()[6..], &[4, 5, 6]);

        let v = mesh.read_vertices::<ExtendedQuadVertex>().unwrap();
        assert_eq!(v.len(), 7);
        assert_eq!(v[6].color, Rgba8::new(0, 0, 255, 255));
        assert_eq!(v[6].uv3, [1.0, 1.0]);
        assert_eq!(v[6].uv1, [0.0, 0.0]);
    }

    #[test]
    fn empty_mesh_part_is_noop() {
        let mut b = batcher(false);
        b.draw_mesh(&MeshPart::new(&[], &[], MeshColors::Uniform(ColorRgba::WHITE), &[0, 1, 2]));
        let verts = [Vec2::ZERO; 3];
        b.draw_mesh(&MeshPart::new(&verts, &verts, MeshColors::Uniform(ColorRgba::WHITE), &[]));
        assert!(b.is_complete());
    }

    #[test]
    fn malformed_mesh_parts_are_rejected() {
        let mut b = batcher(true);
        let verts = [Vec2::ZERO; 3];
        let short = [Vec2::ZERO; 2];
        let colors = [ColorRgba::WHITE; 2];

        b.draw_mesh(&MeshPart::new(&verts, &short, MeshColors::Uniform(ColorRgba::WHITE), &[0, 1, 2]));
        b.draw_mesh(&MeshPart::new(&verts, &verts, MeshColors::PerVertex(&colors), &[0, 1, 2]));
        b.draw_mesh(&MeshPart::new(&verts, &verts, MeshColors::Uniform(ColorRgba::WHITE), &[0, 1]));
        b.draw_mesh(&MeshPart::new(&verts, &verts, MeshColors::Uniform(ColorRgba::WHITE), &[0, 1, 3]));

        let mut part = MeshPart::new(&verts, &verts, MeshColors::Uniform(ColorRgba::WHITE), &[0, 1, 2]);
        part.extra_uvs[0] = Some(&short);
        b.draw_mesh(&part);

        assert!(b.is_complete());
    }
}
