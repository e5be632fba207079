//! Bouncing-box particles: the demo's item type and its update job.

use std::sync::Arc;

use quadflow_engine::batch::{Renderable, SharedItems};
use quadflow_engine::coords::{ColorRgba, Vec2};
use quadflow_engine::jobs::{schedule, JobHandle};
use rand::Rng;
use rayon::prelude::*;

use crate::config::SimulationConfig;
use crate::ease::{ease_in, lerp};
use crate::random::{check_chance, random_angle, random_factor, WeightedRandomizer};

/// Radians per second every particle spins.
const SPIN_SPEED: f32 = 0.2;

/// Axis-aligned box particles bounce inside.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Visible area of an orthographic camera centered on the origin.
    pub fn from_camera(half_height: f32, aspect: f32) -> Self {
        let half = Vec2::new(half_height * aspect, half_height);
        Self { min: -half, max: half }
    }
}

/// Per-frame inputs of [`Particle::step`].
#[derive(Debug, Copy, Clone)]
pub struct Motion {
    pub bounds: Bounds,
    pub speed_min: f32,
    pub speed_max: f32,
    pub dt: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub color: ColorRgba,
    pub moving_left: bool,
    pub moving_up: bool,
    /// Eased factor between the configured min and max speed.
    pub speed_factor: f32,
    pub sprite_index: i32,
    pub angle: f32,
    pub scale: f32,
}

impl Particle {
    /// Moves diagonally and flips direction on reaching a bound.
    pub fn step(&mut self, motion: &Motion) {
        let distance = lerp(motion.speed_min, motion.speed_max, self.speed_factor) * motion.dt;
        let Bounds { min, max } = motion.bounds;

        if self.moving_left {
            self.position.x -= distance;
            if self.position.x <= min.x {
                self.moving_left = false;
            }
        } else {
            self.position.x += distance;
            if self.position.x >= max.x {
                self.moving_left = true;
            }
        }

        if self.moving_up {
            self.position.y += distance;
            if self.position.y >= max.y {
                self.moving_up = false;
            }
        } else {
            self.position.y -= distance;
            if self.position.y <= min.y {
                self.moving_up = true;
            }
        }

        self.angle += SPIN_SPEED * motion.dt;
    }
}

impl Renderable for Particle {
    fn is_visible(&self) -> bool {
        true
    }

    fn sprite_index(&self) -> i32 {
        self.sprite_index
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn scale(&self) -> Vec2 {
        Vec2::splat(self.scale)
    }

    fn rotation_angle(&self) -> f32 {
        self.angle
    }

    fn color(&self) -> ColorRgba {
        self.color
    }
}

/// Mostly white particles with the odd black, blue, green or red one.
fn palette() -> WeightedRandomizer<ColorRgba> {
    let mut colors = WeightedRandomizer::new();
    colors
        .add(ColorRgba::BLACK, 1.0)
        .add(ColorRgba::BLUE, 1.0)
        .add(ColorRgba::GREEN, 1.0)
        .add(ColorRgba::RED, 1.0)
        .add(ColorRgba::WHITE, 50.0);
    colors
}

/// Scatters `config.sprite_count` particles inside `bounds`, using sprites `0..sprite_kinds`.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    bounds: Bounds,
    sprite_kinds: i32,
) -> Vec<Particle> {
    let colors = palette();
    let last_sprite = (sprite_kinds - 1).max(0);

    (0..config.sprite_count)
        .map(|_| {
            // Three ease-ins: most particles crawl, a few are fast.
            let speed_factor = ease_in(ease_in(ease_in(random_factor(rng))));

            Particle {
                position: Vec2::new(
                    rng.gen_range(bounds.min.x..=bounds.max.x),
                    rng.gen_range(bounds.min.y..=bounds.max.y),
                ),
                color: colors.pick(rng).copied().unwrap_or(ColorRgba::WHITE),
                moving_left: check_chance(rng, 0.5),
                moving_up: check_chance(rng, 0.5),
                speed_factor,
                sprite_index: rng.gen_range(0..=last_sprite),
                angle: random_angle(rng),
                scale: lerp(config.scale_min, config.scale_max, ease_in(random_factor(rng))),
            }
        })
        .collect()
}

/// Schedules a parallel [`Particle::step`] over all particles.
///
/// The returned handle is the dependency to start the batch with.
pub fn schedule_update(
    particles: &SharedItems<Particle>,
    motion: Motion,
    chunk: usize,
    dependency: &JobHandle,
) -> JobHandle {
    let particles = Arc::clone(particles);
    schedule(dependency, move || {
        particles
            .write()
            .par_iter_mut()
            .with_min_len(chunk.max(1))
            .for_each(|p| p.step(&motion));
    })
}
