use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rayon::prelude::*;

use crate::coords::{Rgba8, Vec2};
use crate::geometry::calculate_position_sin_cos;
use crate::jobs::{schedule_with_output, Job, JobError, JobHandle};
use crate::mesh::{Mesh, QuadGeometry, QuadIndices, QuadVertex, SubMesh};
use crate::sprite::{template_at, SpriteQuadTemplate, SpriteTemplates};

use super::renderable::Renderable;

/// Item storage shared between the update stage and the batch pipeline.
///
/// Update jobs take the write lock; the vertex job takes the read lock only
/// after its dependency (the update) has completed.
pub type SharedItems<T> = Arc<RwLock<Vec<T>>>;

/// Minimum number of items one worker processes per parallel split.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChunkSizes {
    pub vertex: usize,
    pub index: usize,
}

impl ChunkSizes {
    pub const DEFAULT_VERTEX: usize = 256;
    pub const DEFAULT_INDEX: usize = 512;
}

impl Default for ChunkSizes {
    fn default() -> Self {
        Self {
            vertex: Self::DEFAULT_VERTEX,
            index: Self::DEFAULT_INDEX,
        }
    }
}

struct VertexOutput {
    quads: Vec<QuadGeometry>,
    missing_sprites: usize,
}

/// Scratch buffers of the batch in flight, owned by their jobs until finalize.
struct InFlight {
    item_count: usize,
    vertex_job: Job<VertexOutput>,
    index_job: Job<Vec<QuadIndices>>,
}

/// Parallel quad generator for one item collection, split across a frame.
///
/// ```text
/// Idle --batch_start--> Batching --batch_finalize--> Idle
/// ```
///
/// [`batch_start`](Self::batch_start) schedules vertex and index generation on
/// the worker pool and returns; [`batch_finalize`](Self::batch_finalize)
/// (later in the frame, or next frame) waits for both and writes the mesh.
/// Every item produces exactly one quad, in item order.
pub struct BatchPipeline<T> {
    in_flight: Option<InFlight>,
    _items: PhantomData<fn(&T)>,
}

impl<T> BatchPipeline<T>
where
    T: Renderable + Send + Sync + 'static,
{
    pub fn new() -> Self {
        log::debug!(
            "batch pipeline: vertex {} B, quad {} B, quad indices {} B",
            std::mem::size_of::<QuadVertex>(),
            std::mem::size_of::<QuadGeometry>(),
            std::mem::size_of::<QuadIndices>()
        );
        Self {
            in_flight: None,
            _items: PhantomData,
        }
    }

    /// Schedules quad generation for the first `item_count` items.
    ///
    /// Both jobs wait for `dependency` before touching anything, so pass the
    /// handle of whatever job last mutates `items`.
    ///
    /// # Panics
    /// - if a batch is already in flight
    /// - if `item_count` exceeds `items.len()` (checked here when the items are
    ///   not locked by a running update, otherwise reported by `batch_finalize`)
    /// - if `item_count * 6` does not fit a `u32` index buffer
    pub fn batch_start(
        &mut self,
        items: &SharedItems<T>,
        item_count: usize,
        sprites: &SpriteTemplates,
        dependency: &JobHandle,
        chunks: ChunkSizes,
    ) {
        assert!(
            self.in_flight.is_none(),
            "batch_start called while a batch is already in flight"
        );
        assert!(
            item_count
                .checked_mul(6)
                .is_some_and(|n| u32::try_from(n).is_ok()),
            "item_count {item_count} overflows a u32 index buffer"
        );
        if let Some(guard) = items.try_read() {
            assert!(
                item_count <= guard.len(),
                "item_count {item_count} exceeds item storage length {}",
                guard.len()
            );
        }

        let vertex_job = {
            let items = Arc::clone(items);
            let sprites = Arc::clone(sprites);
            let chunk = chunks.vertex.max(1);
            schedule_with_output(dependency, move || {
                generate_vertices(&items.read(), item_count, &sprites, chunk)
            })
        };

        let index_job = {
            let chunk = chunks.index.max(1);
            schedule_with_output(dependency, move || generate_indices(item_count, chunk))
        };

        self.in_flight = Some(InFlight {
            item_count,
            vertex_job,
            index_job,
        });
    }

    /// Waits for the batch in flight and writes it into `mesh`.
    ///
    /// No-op when idle. On success the mesh holds `4 * item_count` vertices
    /// in the [`QuadVertex`] layout, `6 * item_count` indices and one
    /// triangle-list sub-mesh. If a generation job panicked, the mesh is left
    /// cleared and the error is returned; the pipeline is idle either way.
    pub fn batch_finalize(&mut self, mesh: &mut Mesh) -> Result<(), JobError> {
        let Some(batch) = self.in_flight.take() else {
            return Ok(());
        };

        mesh.clear();

        let vertices = match batch.vertex_job.complete() {
            Ok(v) => v,
            Err(err) => {
                // Still drain the index job so its scratch buffer is released.
                let _ = batch.index_job.complete();
                return Err(err);
            }
        };

        if vertices.missing_sprites > 0 {
            log::warn!(
                "{} visible items referenced sprites outside the table; emitted as degenerate quads",
                vertices.missing_sprites
            );
        }

        let flat_vertices: &[QuadVertex] = bytemuck::cast_slice(&vertices.quads);
        mesh.set_vertex_buffer(flat_vertices, QuadVertex::LAYOUT);
        drop(vertices);

        let indices = batch.index_job.complete()?;
        let flat_indices: &[u32] = bytemuck::cast_slice(&indices);
        mesh.set_index_buffer(flat_indices);
        mesh.set_submesh(SubMesh::triangles(0, flat_indices.len() as u32));

        log::trace!("batch finalized: {} items", batch.item_count);
        Ok(())
    }
}

impl<T> BatchPipeline<T> {
    #[inline]
    pub fn is_batching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Item count of the batch in flight.
    #[inline]
    pub fn batched_item_count(&self) -> Option<usize> {
        self.in_flight.as_ref().map(|b| b.item_count)
    }

    /// Handle completing when both generation jobs of the batch in flight are done.
    ///
    /// Already complete when idle. Useful as the dependency of work that must
    /// not overlap the batch (e.g. removing dead items).
    pub fn completion_handle(&self) -> JobHandle {
        match &self.in_flight {
            Some(b) => JobHandle::combine(&[b.vertex_job.handle().clone(), b.index_job.handle().clone()]),
            None => JobHandle::completed(),
        }
    }

    /// Waits for any batch in flight and releases its scratch buffers without
    /// writing a mesh.
    pub fn shutdown(&mut self) {
        if let Some(batch) = self.in_flight.take() {
            log::debug!("batch pipeline shutdown with {} items in flight", batch.item_count);
            let _ = batch.vertex_job.complete();
            let _ = batch.index_job.complete();
        }
    }
}

impl<T> Default for BatchPipeline<T>
where
    T: Renderable + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for BatchPipeline<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn generate_vertices<T: Renderable + Sync>(
    items: &[T],
    item_count: usize,
    sprites: &[SpriteQuadTemplate],
    chunk: usize,
) -> VertexOutput {
    let Some(items) = items.get(..item_count) else {
        panic!("item_count {item_count} exceeds item storage length {}", items.len());
    };

    let missing = AtomicUsize::new(0);
    let mut quads = Vec::with_capacity(item_count);

    items
        .par_iter()
        .with_min_len(chunk)
        .map(|item| {
            item_quad(item, sprites).unwrap_or_else(|| {
                missing.fetch_add(1, Ordering::Relaxed);
                degenerate_quad(item.position())
            })
        })
        .collect_into_vec(&mut quads);

    VertexOutput {
        quads,
        missing_sprites: missing.into_inner(),
    }
}

fn generate_indices(item_count: usize, chunk: usize) -> Vec<QuadIndices> {
    let mut indices = Vec::with_capacity(item_count);
    (0..item_count as u32)
        .into_par_iter()
        .with_min_len(chunk)
        .map(QuadIndices::for_quad)
        .collect_into_vec(&mut indices);
    indices
}

/// Quad of one item; `None` if it is visible but its sprite is not in `sprites`.
pub fn item_quad<T: Renderable>(item: &T, sprites: &[SpriteQuadTemplate]) -> Option<QuadGeometry> {
    if !item.is_visible() {
        return Some(degenerate_quad(item.position()));
    }

    let sprite = template_at(sprites, item.sprite_index())?;

    let position = item.position();
    let scale = item.scale();
    let (sin, cos) = item.rotation_angle().sin_cos();
    let color = item.color().to_rgba8();

    let corners = sprite.vertices();
    let uvs = sprite.uvs();
    let vertex = |i: usize| {
        QuadVertex::new(
            calculate_position_sin_cos(corners[i], position, scale, sin, cos),
            color,
            uvs[i],
        )
    };

    Some(QuadGeometry {
        vertices: [vertex(0), vertex(1), vertex(2), vertex(3)],
    })
}

/// Zero-area, fully transparent quad at `position`.
#[inline]
pub fn degenerate_quad(position: Vec2) -> QuadGeometry {
    let v = QuadVertex::new(position, Rgba8::TRANSPARENT, Vec2::ZERO);
    QuadGeometry { vertices: [v; 4] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ColorRgba;
    use crate::jobs::schedule;
    use crate::sprite::{SpriteSource, SpriteTable, TextureId};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[derive(Debug, Clone, Copy)]
    struct Item {
        visible: bool,
        sprite: i32,
        position: Vec2,
        scale: Vec2,
        angle: f32,
        color: ColorRgba,
    }

    impl Item {
        fn at(sprite: i32, position: Vec2) -> Self {
            Self {
                visible: true,
                sprite,
                position,
                scale: Vec2::ONE,
                angle: 0.0,
                color: ColorRgba::WHITE,
            }
        }
    }

    impl Renderable for Item {
        fn is_visible(&self) -> bool {
            self.visible
        }
        fn sprite_index(&self) -> i32 {
            self.sprite
        }
        fn position(&self) -> Vec2 {
            self.position
        }
        fn scale(&self) -> Vec2 {
            self.scale
        }
        fn rotation_angle(&self) -> f32 {
            self.angle
        }
        fn color(&self) -> ColorRgba {
            self.color
        }
    }

    fn unit_table(count: usize) -> SpriteTable {
        let sources: Vec<_> = (0..count)
            .map(|i| {
                SpriteSource::rect(
                    format!("unit{i}"),
                    Vec2::ONE,
                    Vec2::new(0.0, 0.0),
                    Vec2::new(1.0, 1.0),
                    TextureId(0),
                )
            })
            .collect();
        SpriteTable::build(&sources)
    }

    fn shared(items: Vec<Item>) -> SharedItems<Item> {
        Arc::new(RwLock::new(items))
    }

    fn run(items: &SharedItems<Item>, count: usize, table: &SpriteTable, chunks: ChunkSizes) -> Mesh {
        let mut pipeline = BatchPipeline::new();
        let mut mesh = Mesh::new("test");
        pipeline.batch_start(items, count, &table.templates(), &JobHandle::completed(), chunks);
        pipeline.batch_finalize(&mut mesh).unwrap();
        assert!(!pipeline.is_batching());
        mesh
    }

    fn assert_vec_eq(v: [f32; 3], x: f32, y: f32) {
        assert_relative_eq!(v[0], x, epsilon = 1e-5);
        assert_relative_eq!(v[1], y, epsilon = 1e-5);
        assert_eq!(v[2], 0.0);
    }

    // ── sample scenario ───────────────────────────────────────────────────

    #[test]
    fn three_item_scenario() {
        let table = unit_table(2);
        let mut hidden = Item::at(0, Vec2::new(5.0, -3.0));
        hidden.visible = false;
        let mut rotated = Item::at(1, Vec2::new(0.0, 2.0));
        rotated.scale = Vec2::splat(2.0);
        rotated.angle = FRAC_PI_2;

        let items = shared(vec![Item::at(0, Vec2::new(1.0, 0.0)), hidden, rotated]);
        let mesh = run(&items, 3, &table, ChunkSizes::default());

        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.index_count(), 18);

        let v = mesh.read_vertices::<QuadVertex>().unwrap();

        // item0: unit quad translated to (1, 0)
        assert_vec_eq(v[0].position, 0.5, 0.5);
        assert_vec_eq(v[3].position, 1.5, -0.5);

        // item1: degenerate at its raw position
        for vert in &v[4..8] {
            assert_eq!(vert.position, [5.0, -3.0, 0.0]);
            assert_eq!(vert.color.a, 0);
            assert_eq!(vert.uv, [0.0, 0.0]);
        }

        // item2: 2x unit quad rotated a quarter turn, moved to (0, 2)
        assert_vec_eq(v[8].position, -1.0, 1.0);
        assert_vec_eq(v[9].position, -1.0, 3.0);
        assert_vec_eq(v[10].position, 1.0, 1.0);
        assert_vec_eq(v[11].position, 1.0, 3.0);
    }

    // ── counts and ranges ─────────────────────────────────────────────────

    #[test]
    fn counts_and_index_range_for_many_items() {
        let table = unit_table(1);
        let n = 5_000;
        let items = shared((0..n).map(|i| Item::at(0, Vec2::new(i as f32, 0.0))).collect());
        let mesh = run(&items, n, &table, ChunkSizes { vertex: 7, index: 13 });

        assert_eq!(mesh.vertex_count(), 4 * n);
        assert_eq!(mesh.index_count(), 6 * n);
        assert!(mesh.indices().iter().all(|&i| (i as usize) < 4 * n));
        assert_eq!(mesh.submeshes(), &[SubMesh::triangles(0, 6 * n as u32)]);
        assert_eq!(mesh.layout(), Some(QuadVertex::LAYOUT));

        for (q, chunk) in mesh.indices().chunks_exact(6).enumerate() {
            let b = 4 * q as u32;
            assert_eq!(chunk, &[b, b + 1, b + 2, b + 2, b + 1, b + 3]);
        }

        // Output order follows item order.
        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        for (i, quad) in v.chunks_exact(4).enumerate() {
            assert_relative_eq!(quad[0].position[0], i as f32 - 0.5);
        }
    }

    #[test]
    fn item_count_may_be_smaller_than_storage() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(0, Vec2::ZERO); 10]);
        let mesh = run(&items, 4, &table, ChunkSizes::default());
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.index_count(), 24);
    }

    #[test]
    fn zero_items_produce_empty_mesh() {
        let table = unit_table(1);
        let mesh = run(&shared(Vec::new()), 0, &table, ChunkSizes::default());
        assert!(mesh.is_empty());
        assert_eq!(mesh.submeshes(), &[SubMesh::triangles(0, 0)]);
    }

    // ── appearance ────────────────────────────────────────────────────────

    #[test]
    fn uvs_are_not_affected_by_transform() {
        let source = SpriteSource::rect(
            "tile",
            Vec2::new(3.0, 1.0),
            Vec2::new(0.25, 0.5),
            Vec2::new(0.5, 0.75),
            TextureId(0),
        );
        let table = SpriteTable::build(std::slice::from_ref(&source));
        let mut item = Item::at(0, Vec2::new(9.0, 9.0));
        item.angle = 1.3;
        item.scale = Vec2::new(-2.0, 0.5);

        let mesh = run(&shared(vec![item]), 1, &table, ChunkSizes::default());
        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        for (vert, uv) in v.iter().zip(&source.uvs) {
            assert_eq!(vert.uv, uv.to_array());
        }
    }

    #[test]
    fn color_is_quantized_per_vertex() {
        let table = unit_table(1);
        let mut item = Item::at(0, Vec2::ZERO);
        item.color = ColorRgba::new(1.0, 0.0, 0.0, 0.5);

        let mesh = run(&shared(vec![item]), 1, &table, ChunkSizes::default());
        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        assert!(v.iter().all(|vert| vert.color == Rgba8::new(255, 0, 0, 128)));
    }

    #[test]
    fn missing_sprite_is_emitted_degenerate() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(5, Vec2::new(2.0, 2.0)), Item::at(-1, Vec2::ZERO)]);
        let mesh = run(&items, 2, &table, ChunkSizes::default());

        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        assert!(v[..4].iter().all(|vert| vert.position == [2.0, 2.0, 0.0] && vert.color.a == 0));
        assert!(v[4..].iter().all(|vert| vert.color.a == 0));
    }

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn finalize_without_start_is_noop() {
        let mut pipeline: BatchPipeline<Item> = BatchPipeline::new();
        let mut mesh = Mesh::new("test");
        mesh.set_index_buffer(&[0, 1, 2]);
        let revision = mesh.revision();

        assert!(pipeline.batch_finalize(&mut mesh).is_ok());
        assert!(pipeline.batch_finalize(&mut mesh).is_ok());
        assert_eq!(mesh.revision(), revision);
        assert_eq!(mesh.index_count(), 3);
    }

    #[test]
    #[should_panic(expected = "already in flight")]
    fn start_while_batching_fails_fast() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(0, Vec2::ZERO)]);
        let mut pipeline = BatchPipeline::new();
        pipeline.batch_start(&items, 1, &table.templates(), &JobHandle::completed(), ChunkSizes::default());
        pipeline.batch_start(&items, 1, &table.templates(), &JobHandle::completed(), ChunkSizes::default());
    }

    #[test]
    #[should_panic(expected = "exceeds item storage length")]
    fn start_with_too_many_items_fails_fast() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(0, Vec2::ZERO)]);
        let mut pipeline = BatchPipeline::new();
        pipeline.batch_start(&items, 2, &table.templates(), &JobHandle::completed(), ChunkSizes::default());
    }

    #[test]
    fn pipeline_is_reusable_across_frames() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(0, Vec2::ZERO); 3]);
        let mut pipeline = BatchPipeline::new();
        let mut mesh = Mesh::new("test");

        for count in [3, 1, 2] {
            pipeline.batch_start(&items, count, &table.templates(), &JobHandle::completed(), ChunkSizes::default());
            assert_eq!(pipeline.batched_item_count(), Some(count));
            pipeline.batch_finalize(&mut mesh).unwrap();
            assert_eq!(mesh.vertex_count(), 4 * count);
        }
    }

    #[test]
    fn shutdown_releases_batch_without_touching_mesh() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(0, Vec2::ZERO); 8]);
        let mut pipeline = BatchPipeline::new();
        let mut mesh = Mesh::new("test");

        pipeline.batch_start(&items, 8, &table.templates(), &JobHandle::completed(), ChunkSizes::default());
        let handle = pipeline.completion_handle();
        pipeline.shutdown();

        assert!(!pipeline.is_batching());
        assert!(handle.is_completed());
        pipeline.batch_finalize(&mut mesh).unwrap();
        assert_eq!(mesh.revision(), 0);
    }

    #[test]
    fn failed_generation_leaves_mesh_cleared_and_idle() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(0, Vec2::ZERO); 2]);
        let (gate, open) = JobHandle::pending();

        let mut pipeline = BatchPipeline::new();
        let mut mesh = Mesh::new("test");
        mesh.set_index_buffer(&[0, 1, 2]);
        mesh.set_submesh(SubMesh::triangles(0, 3));

        // With the items locked, the length check moves into the vertex job.
        {
            let _update = items.write();
            pipeline.batch_start(&items, 5, &table.templates(), &gate, ChunkSizes::default());
        }
        drop(open);

        let result = pipeline.batch_finalize(&mut mesh);
        assert!(matches!(result, Err(JobError::Panicked(_))), "{result:?}");
        assert!(mesh.is_empty());
        assert!(mesh.submeshes().is_empty());
        assert!(!pipeline.is_batching());

        // Usable again afterwards.
        pipeline.batch_start(&items, 2, &table.templates(), &JobHandle::completed(), ChunkSizes::default());
        pipeline.batch_finalize(&mut mesh).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
    }

    // ── dependencies ──────────────────────────────────────────────────────

    #[test]
    fn generation_waits_for_dependency() {
        let table = unit_table(1);
        let items = shared(vec![Item::at(0, Vec2::ZERO); 64]);

        let update_items = Arc::clone(&items);
        let update = schedule(&JobHandle::completed(), move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            for item in update_items.write().iter_mut() {
                item.position = Vec2::new(10.0, 10.0);
                item.visible = false;
            }
        });

        let mut pipeline = BatchPipeline::new();
        let mut mesh = Mesh::new("test");
        pipeline.batch_start(&items, 64, &table.templates(), &update, ChunkSizes { vertex: 8, index: 8 });
        pipeline.batch_finalize(&mut mesh).unwrap();

        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        assert!(v.iter().all(|vert| vert.position == [10.0, 10.0, 0.0]));
    }

    #[test]
    fn rebuilding_table_does_not_affect_batch_in_flight() {
        let mut table = unit_table(2);
        let items = shared(vec![Item::at(1, Vec2::ZERO)]);
        let (gate, open) = JobHandle::pending();

        let mut pipeline = BatchPipeline::new();
        let mut mesh = Mesh::new("test");
        pipeline.batch_start(&items, 1, &table.templates(), &gate, ChunkSizes::default());
        table.rebuild(&[]);
        drop(open);
        pipeline.batch_finalize(&mut mesh).unwrap();

        let v = mesh.read_vertices::<QuadVertex>().unwrap();
        assert!(v.iter().all(|vert| vert.color == Rgba8::WHITE));
    }
}
