use bytemuck::{Pod, Zeroable};

/// Straight-alpha RGBA color with `f32` channels in `[0, 1]`.
///
/// This is the color items and draw calls are specified in. It is quantized to
/// [`Rgba8`] when written into a vertex stream.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    pub const TRANSPARENT: ColorRgba = ColorRgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: ColorRgba = ColorRgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: ColorRgba = ColorRgba::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: ColorRgba = ColorRgba::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: ColorRgba = ColorRgba::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: ColorRgba = ColorRgba::new(0.0, 0.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Quantizes to 8-bit unorm channels (clamped, rounded to nearest).
    #[inline]
    pub fn to_rgba8(self) -> Rgba8 {
        Rgba8::new(
            unorm8(self.r),
            unorm8(self.g),
            unorm8(self.b),
            unorm8(self.a),
        )
    }
}

#[inline]
fn unorm8(v: f32) -> u8 {
    // NaN clamps to 0 through the `as` cast.
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// 4×8-bit unsigned normalized color, the vertex-stream color format.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<ColorRgba> for Rgba8 {
    #[inline]
    fn from(c: ColorRgba) -> Self {
        c.to_rgba8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantizes_extremes() {
        assert_eq!(ColorRgba::WHITE.to_rgba8(), Rgba8::WHITE);
        assert_eq!(ColorRgba::TRANSPARENT.to_rgba8(), Rgba8::TRANSPARENT);
    }

    #[test]
    fn quantize_clamps_out_of_range() {
        let c = ColorRgba::new(2.0, -1.0, 0.5, f32::NAN).to_rgba8();
        assert_eq!(c, Rgba8::new(255, 0, 128, 0));
    }

    #[test]
    fn rgba8_is_four_bytes() {
        assert_eq!(std::mem::size_of::<Rgba8>(), 4);
    }
}
