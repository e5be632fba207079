//! Headless particle demo.
//!
//! Usage: `quadflow-studio [config.toml]`

mod config;
mod ease;
mod particles;
mod random;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use parking_lot::RwLock;
use quadflow_engine::batch::{BatchPipeline, BatchRenderSetup, ImmediateBatcher, SetupConfig, SharedItems};
use quadflow_engine::coords::Vec2;
use quadflow_engine::geometry::Transform2d;
use quadflow_engine::jobs::JobHandle;
use quadflow_engine::logging::init_logging;
use quadflow_engine::sprite::{SpriteSource, TextureId};
use quadflow_engine::time::FrameClock;
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::{BatchMode, StudioConfig};
use particles::{Bounds, Motion, Particle};

/// Totals of one demo run.
#[derive(Debug, Default)]
struct RunStats {
    frames: u64,
    busy: Duration,
    vertices: usize,
    indices: usize,
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            StudioConfig::load(&path).with_context(|| format!("failed to load config '{path}'"))?
        }
        None => StudioConfig::default(),
    };

    init_logging(config.logging.to_logging_config());
    log::info!(
        "quadflow studio: {} particles, {} frames, {:?} batching",
        config.simulation.sprite_count,
        config.simulation.frames,
        config.batching.mode
    );

    let sources = demo_sources();
    let mut setup = BatchRenderSetup::init(
        SetupConfig {
            mesh_name: "particles".to_owned(),
            ..SetupConfig::default()
        },
        &sources,
    );

    let mut rng = match config.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let sim = &config.simulation;
    let bounds = Bounds::from_camera(sim.half_height, sim.aspect);
    let sprite_kinds = i32::try_from(setup.sprites().len()).context("sprite table too large")?;
    let items: SharedItems<Particle> =
        Arc::new(RwLock::new(particles::generate(&mut rng, sim, bounds, sprite_kinds)));

    let mut clock = match sim.fixed_delta {
        Some(dt) => FrameClock::with_fixed_delta(dt),
        None => FrameClock::new(),
    };

    let stats = match config.batching.mode {
        BatchMode::Jobified => run_jobified(&config, &mut setup, &items, bounds, &mut clock)?,
        BatchMode::Immediate => run_immediate(&config, &mut setup, &items, bounds, &mut clock),
    };

    report(&stats, &setup);
    setup.shutdown();
    Ok(())
}

/// Two rectangle sprites on one atlas page.
fn demo_sources() -> Vec<SpriteSource> {
    vec![
        SpriteSource::rect(
            "box",
            Vec2::splat(0.1),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.5, 1.0),
            TextureId(0),
        ),
        SpriteSource::rect(
            "bar",
            Vec2::new(0.2, 0.05),
            Vec2::new(0.5, 0.0),
            Vec2::new(1.0, 1.0),
            TextureId(0),
        ),
    ]
}

fn motion(config: &StudioConfig, bounds: Bounds, dt: f32) -> Motion {
    Motion {
        bounds,
        speed_min: config.simulation.speed_min,
        speed_max: config.simulation.speed_max,
        dt,
    }
}

/// Update job -> batch_start -> (frame work) -> batch_finalize, every frame.
fn run_jobified(
    config: &StudioConfig,
    setup: &mut BatchRenderSetup,
    items: &SharedItems<Particle>,
    bounds: Bounds,
    clock: &mut FrameClock,
) -> anyhow::Result<RunStats> {
    let mut pipeline = BatchPipeline::new();
    let chunks = config.batching.chunk_sizes();
    let count = items.read().len();
    let mut stats = RunStats::default();

    for _ in 0..config.simulation.frames {
        let ft = clock.tick();
        let started = Instant::now();

        let update = particles::schedule_update(
            items,
            motion(config, bounds, ft.dt),
            config.batching.update_chunk,
            &JobHandle::completed(),
        );

        let (sprites, mesh) = setup.parts_mut();
        pipeline.batch_start(items, count, &sprites.templates(), &update, chunks);
        pipeline
            .batch_finalize(mesh)
            .with_context(|| format!("batch failed on frame {}", ft.frame_index))?;

        stats.busy += started.elapsed();
        stats.frames += 1;
        stats.vertices = mesh.vertex_count();
        stats.indices = mesh.index_count();
        log::trace!("frame {}: dt {:.4}, mesh revision {}", ft.frame_index, ft.dt, mesh.revision());
    }

    Ok(stats)
}

/// Update on the pool, then draw every particle through the immediate batcher.
fn run_immediate(
    config: &StudioConfig,
    setup: &mut BatchRenderSetup,
    items: &SharedItems<Particle>,
    bounds: Bounds,
    clock: &mut FrameClock,
) -> RunStats {
    let mut batcher = ImmediateBatcher::new(setup.sprites().templates(), config.batching.batcher_config());
    let mut stats = RunStats::default();

    for _ in 0..config.simulation.frames {
        let ft = clock.tick();
        let started = Instant::now();

        particles::schedule_update(
            items,
            motion(config, bounds, ft.dt),
            config.batching.update_chunk,
            &JobHandle::completed(),
        )
        .complete();

        for p in items.read().iter() {
            let placement = Transform2d::at(p.position)
                .with_rotation(p.angle)
                .with_uniform_scale(p.scale);
            batcher.draw_sprite(p.sprite_index, &placement, p.color);
        }

        let mesh = setup.mesh_mut();
        batcher.complete_mesh(mesh);

        stats.busy += started.elapsed();
        stats.frames += 1;
        stats.vertices = mesh.vertex_count();
        stats.indices = mesh.index_count();
    }

    stats
}

fn report(stats: &RunStats, setup: &BatchRenderSetup) {
    let per_frame = if stats.frames > 0 {
        stats.busy / u32::try_from(stats.frames).unwrap_or(u32::MAX)
    } else {
        Duration::ZERO
    };
    let material = setup.material();

    log::info!(
        "{} frames in {:.2?} ({:.3?}/frame); last mesh {} vertices, {} indices, {} sub-mesh(es)",
        stats.frames,
        stats.busy,
        per_frame,
        stats.vertices,
        stats.indices,
        setup.mesh().submeshes().len()
    );
    log::info!(
        "material: texture {:?}, tint {:?}",
        material.texture,
        material.tint
    );
}
