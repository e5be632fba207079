use crate::coords::Vec2;

/// Transforms a sprite-local point into world space.
///
/// Applied in order: component-wise `scale`, rotation by `rotation_angle`
/// radians (counter-clockwise), translation by `world_position`.
///
/// Equivalent to [`calculate_position_sin_cos`] with the sine and cosine of
/// `rotation_angle`; both produce bit-identical results.
#[inline]
pub fn calculate_position(
    local: Vec2,
    world_position: Vec2,
    scale: Vec2,
    rotation_angle: f32,
) -> Vec2 {
    let (sin, cos) = rotation_angle.sin_cos();
    calculate_position_sin_cos(local, world_position, scale, sin, cos)
}

/// [`calculate_position`] with a precomputed sine/cosine pair.
///
/// Use this when transforming all corners of one quad: compute the pair once
/// per item and reuse it for each vertex.
#[inline]
pub fn calculate_position_sin_cos(
    local: Vec2,
    world_position: Vec2,
    scale: Vec2,
    sin: f32,
    cos: f32,
) -> Vec2 {
    let scaled = local * scale;

    let rotated = Vec2::new(
        scaled.x * cos - scaled.y * sin,
        scaled.x * sin + scaled.y * cos,
    );

    rotated + world_position
}

/// Rotation angle with its sine and cosine cached.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation {
    pub angle: f32,
    pub sin: f32,
    pub cos: f32,
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation { angle: 0.0, sin: 0.0, cos: 1.0 };

    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { angle, sin, cos }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Placement of a sprite: translation, rotation and scale.
///
/// Any component left at its default is the identity, so callers only spell
/// out what they need:
///
/// ```
/// # use quadflow_engine::coords::Vec2;
/// # use quadflow_engine::geometry::Transform2d;
/// let t = Transform2d::at(Vec2::new(3.0, 1.0)).with_rotation(0.5);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform2d {
    pub position: Vec2,
    pub rotation: Rotation,
    pub scale: Vec2,
}

impl Transform2d {
    pub const IDENTITY: Transform2d = Transform2d {
        position: Vec2::ZERO,
        rotation: Rotation::IDENTITY,
        scale: Vec2::ONE,
    };

    #[inline]
    pub const fn at(position: Vec2) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    #[inline]
    pub fn with_rotation(self, angle: f32) -> Self {
        Self { rotation: Rotation::from_angle(angle), ..self }
    }

    #[inline]
    pub fn with_scale(self, scale: Vec2) -> Self {
        Self { scale, ..self }
    }

    #[inline]
    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec2::splat(scale))
    }

    #[inline]
    pub fn apply(&self, local: Vec2) -> Vec2 {
        calculate_position_sin_cos(
            local,
            self.position,
            self.scale,
            self.rotation.sin,
            self.rotation.cos,
        )
    }
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::IDENTITY
    }
}
