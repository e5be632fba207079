use crate::coords::{ColorRgba, Vec2};

use super::source::QUAD_TRIANGLES;
use super::template::{
    SpriteQuadTemplate, BOTTOM_LEFT, BOTTOM_RIGHT, TOP_LEFT, TOP_RIGHT, VERTICES_PER_QUAD,
};

type Corners = [Vec2; VERTICES_PER_QUAD];

/// Extra UV channels carried by a quad when the batcher runs with extended UVs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UvChannel {
    Uv1,
    Uv2,
    Uv3,
}

/// Full-texture UVs, the reset value of every extra channel.
const FULL_UVS: Corners = [
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
];

/// Mutable quad for hand-built geometry (trails, beams, tinted overlays).
///
/// Keeps the template's corners and UVs as the "original" state so edits can
/// be undone with the `reset_*` methods. Feed it to
/// [`ImmediateBatcher::draw_sprite_quad`](crate::batch::ImmediateBatcher::draw_sprite_quad).
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteQuad {
    original_vertices: Corners,
    original_uv0: Corners,

    pub vertices: Corners,
    pub uv0: Corners,
    pub extra_uvs: [Corners; 3],
    pub colors: [ColorRgba; VERTICES_PER_QUAD],

    width: f32,
    height: f32,
}

impl SpriteQuad {
    /// Unit quad, white, full-texture UVs.
    pub fn new() -> Self {
        Self::from_template(&SpriteQuadTemplate::UNIT)
    }

    pub fn from_template(template: &SpriteQuadTemplate) -> Self {
        Self {
            original_vertices: *template.vertices(),
            original_uv0: *template.uvs(),
            vertices: *template.vertices(),
            uv0: *template.uvs(),
            extra_uvs: [FULL_UVS; 3],
            colors: [ColorRgba::WHITE; VERTICES_PER_QUAD],
            width: template.width(),
            height: template.height(),
        }
    }

    /// Restores the unit quad.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Re-initializes from `template`; `None` logs an error and resets to the unit quad.
    pub fn setup_from_template(&mut self, template: Option<&SpriteQuadTemplate>) {
        match template {
            Some(t) => *self = Self::from_template(t),
            None => {
                log::error!("sprite quad setup without a template; using unit quad");
                self.reset();
            }
        }
    }

    #[inline]
    pub fn triangles(&self) -> &'static [u16; 6] {
        &QUAD_TRIANGLES
    }

    /// Width of the original quad (top edge length).
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Height of the original quad (left edge length).
    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    // ── vertices ──────────────────────────────────────────────────────────

    pub fn reset_vertices(&mut self) {
        self.vertices = self.original_vertices;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.vertices.iter_mut().for_each(|v| *v += delta);
    }

    /// Rotates the current corners around the origin (radians, counter-clockwise).
    pub fn rotate(&mut self, angle: f32) {
        self.vertices.iter_mut().for_each(|v| *v = v.rotated(angle));
    }

    pub fn scale(&mut self, scale: Vec2) {
        self.vertices.iter_mut().for_each(|v| *v *= scale);
    }

    /// Lays the quad out as a line segment of constant [`width`](Self::width).
    ///
    /// `from` becomes the midpoint of the bottom edge, `to` the midpoint of the top edge.
    pub fn from_to(&mut self, from: Vec2, to: Vec2) {
        self.from_to_tapered(from, to, self.width, self.width);
    }

    /// Line segment whose width changes from `from_width` to `to_width`.
    pub fn from_to_tapered(&mut self, from: Vec2, to: Vec2, from_width: f32, to_width: f32) {
        let normal = (to - from).normal();
        let n_from = normal * (from_width * 0.5);
        let n_to = normal * (to_width * 0.5);

        self.vertices[BOTTOM_LEFT] = from - n_from;
        self.vertices[BOTTOM_RIGHT] = from + n_from;
        self.vertices[TOP_LEFT] = to - n_to;
        self.vertices[TOP_RIGHT] = to + n_to;
    }

    // ── uvs ───────────────────────────────────────────────────────────────

    pub fn reset_uv0(&mut self) {
        self.uv0 = self.original_uv0;
    }

    pub fn offset_uv0(&mut self, delta: Vec2) {
        self.uv0.iter_mut().for_each(|uv| *uv += delta);
    }

    pub fn set_uniform_uv0(&mut self, value: Vec2) {
        self.uv0 = [value; VERTICES_PER_QUAD];
    }

    pub fn reset_extra_uv(&mut self, channel: UvChannel) {
        *self.extra_mut(channel) = FULL_UVS;
    }

    pub fn set_uniform_uv(&mut self, channel: UvChannel, value: Vec2) {
        *self.extra_mut(channel) = [value; VERTICES_PER_QUAD];
    }

    /// Copies this quad's original UVs into an extra channel.
    pub fn copy_uv_from_original(&mut self, channel: UvChannel) {
        let uvs = self.original_uv0;
        *self.extra_mut(channel) = uvs;
    }

    /// Copies another quad's original UVs into an extra channel (e.g. a mask sprite).
    pub fn copy_uv_from(&mut self, channel: UvChannel, other: &SpriteQuad) {
        *self.extra_mut(channel) = other.original_uv0;
    }

    /// Copies another quad's original UVs into the primary channel.
    pub fn copy_uv0_from(&mut self, other: &SpriteQuad) {
        self.uv0 = other.original_uv0;
    }

    #[inline]
    pub fn extra_uv(&self, channel: UvChannel) -> &Corners {
        &self.extra_uvs[channel as usize]
    }

    fn extra_mut(&mut self, channel: UvChannel) -> &mut Corners {
        &mut self.extra_uvs[channel as usize]
    }

    // ── colors ────────────────────────────────────────────────────────────

    pub fn reset_colors(&mut self, color: ColorRgba) {
        self.colors = [color; VERTICES_PER_QUAD];
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.colors.iter_mut().for_each(|c| c.a = alpha);
    }

    /// Fades along the segment laid out by [`from_to`](Self::from_to).
    pub fn set_alpha_from_to(&mut self, from_alpha: f32, to_alpha: f32) {
        self.colors[BOTTOM_LEFT].a = from_alpha;
        self.colors[BOTTOM_RIGHT].a = from_alpha;
        self.colors[TOP_LEFT].a = to_alpha;
        self.colors[TOP_RIGHT].a = to_alpha;
    }
}

impl Default for SpriteQuad {
    fn default() -> Self {
        Self::new()
    }
}
