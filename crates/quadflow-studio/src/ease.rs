/// Linear interpolation; `t` is not clamped.
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    to * t + from * (1.0 - t)
}

/// Quadratic ease-in: slow start, fast finish.
#[inline]
pub fn ease_in(t: f32) -> f32 {
    t * t
}
