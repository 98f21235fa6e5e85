//! The painter: turns brush strokes into paint jobs.
//!
//! A [`Painter`] owns the worker pool, the vertex position cache and every
//! in-flight [`PaintJobHandle`]. The host calls [`Painter::paint`] when the
//! brush is applied and [`Painter::update`] once per tick to merge finished
//! jobs.

use std::sync::Arc;
use std::time::Instant;

use vcpaint_core::math::Vec3;
use vcpaint_core::mesh::{CpuMesh, MeshId};

use crate::batch::BatchConfig;
use crate::brush::BrushSettings;
use crate::cache::VertexPositionCache;
use crate::error::PaintError;
use crate::job::{PaintArgs, PaintJobHandle};
use crate::reference;
use crate::target::{PaintableMesh, SharedMesh, SpatialQuery};
use crate::worker_pool::WorkerPool;

/// Outer radii within this distance of zero paint nothing.
const MIN_OUTER_RADIUS: f32 = 1e-6;

/// How a [`Painter`] executes paint operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintMode {
    /// Paint synchronously on the calling thread with the reference painter.
    SingleThreaded,
    /// Split each mesh into batches on the worker pool.
    #[default]
    Parallel,
}

/// Configuration for a [`Painter`].
#[derive(Debug, Clone, Default)]
pub struct PainterConfig {
    pub mode: PaintMode,
    /// Worker thread count. `None` uses one thread per CPU core.
    pub num_threads: Option<usize>,
    pub batching: BatchConfig,
    pub brush: BrushSettings,
}

impl PainterConfig {
    pub fn with_mode(mut self, mode: PaintMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_batching(mut self, batching: BatchConfig) -> Self {
        self.batching = batching;
        self
    }

    pub fn with_brush(mut self, brush: BrushSettings) -> Self {
        self.brush = brush;
        self
    }
}

/// Observer notified after every parallel job merged its colors.
pub type JobObserver<M> = Arc<dyn Fn(&PaintJobHandle<M>) + Send + Sync>;

/// Schedules paint jobs and tracks them until they are merged.
///
/// At most one job per mesh is in flight: painting a mesh whose previous job
/// has not been merged yet is skipped. Dropping the painter blocks until
/// every in-flight job has completed.
pub struct Painter<M: PaintableMesh + 'static = CpuMesh> {
    config: PainterConfig,
    pool: Arc<WorkerPool>,
    cache: Arc<VertexPositionCache>,
    handles: Vec<PaintJobHandle<M>>,
    observer: Option<JobObserver<M>>,
    /// When the current pass (period with jobs in flight) began.
    pass_started: Option<Instant>,
    completed_jobs: usize,
}

impl<M: PaintableMesh + 'static> Painter<M> {
    /// Create a painter with its own worker pool.
    pub fn new(config: PainterConfig) -> Result<Self, PaintError> {
        let pool = match config.num_threads {
            Some(n) => WorkerPool::new(n)?,
            None => WorkerPool::default_threads()?,
        };
        Ok(Self::with_pool(config, Arc::new(pool)))
    }

    /// Create a painter running on an existing pool.
    pub fn with_pool(config: PainterConfig, pool: Arc<WorkerPool>) -> Self {
        log::debug!(
            "Painter created: {:?} mode, {} worker threads",
            config.mode,
            pool.num_threads()
        );
        Self {
            config,
            pool,
            cache: Arc::new(VertexPositionCache::new()),
            handles: Vec::new(),
            observer: None,
            pass_started: None,
            completed_jobs: 0,
        }
    }

    /// Register an observer for completed parallel jobs.
    ///
    /// Applies to jobs started after this call. Synchronous paints in
    /// [`PaintMode::SingleThreaded`] create no job and are not observed.
    pub fn on_job_completed(
        &mut self,
        observer: impl Fn(&PaintJobHandle<M>) + Send + Sync + 'static,
    ) {
        self.observer = Some(Arc::new(observer));
    }

    /// Paint every mesh `query` reports inside the brush's outer radius.
    ///
    /// Returns the number of meshes painted or scheduled.
    pub fn paint(&mut self, query: &impl SpatialQuery<M>) -> Result<usize, PaintError> {
        let brush = self.config.brush;
        if brush.outer_radius.abs() <= MIN_OUTER_RADIUS {
            return Ok(0);
        }
        brush.validate()?;

        let mut painted = 0;
        for mesh in query.overlap_sphere(&brush.position, brush.outer_radius) {
            if self.paint_mesh(mesh)? {
                painted += 1;
            }
        }
        Ok(painted)
    }

    /// Paint a single mesh with the current brush.
    ///
    /// Returns `Ok(false)` without doing anything when the outer radius is
    /// (almost) zero or the mesh already has a job in flight. Any other
    /// invalid radii, a negative outer radius included, fail with
    /// [`PaintError::InvalidRadii`].
    pub fn paint_mesh(&mut self, mesh: SharedMesh<M>) -> Result<bool, PaintError> {
        let brush = self.config.brush;
        if brush.outer_radius.abs() <= MIN_OUTER_RADIUS {
            return Ok(false);
        }

        match self.config.mode {
            PaintMode::SingleThreaded => {
                let state = brush.snapshot()?;
                let started = Instant::now();
                let mut mesh = mesh.write();
                reference::paint_mesh(&mut *mesh, &state);
                log::debug!(
                    "Painted {} synchronously in {:?}",
                    mesh.mesh_id(),
                    started.elapsed()
                );
                self.completed_jobs += 1;
                Ok(true)
            }
            PaintMode::Parallel => {
                let id = mesh.read().mesh_id();
                if self.is_in_flight(id) {
                    log::trace!("Skipping {id}: previous job still in flight");
                    return Ok(false);
                }

                let mut handle = PaintJobHandle::new(self.pool.clone(), self.cache.clone());
                if let Some(observer) = &self.observer {
                    let observer = observer.clone();
                    handle.on_completed(move |h| observer(h));
                }
                handle.start(
                    PaintArgs::new(brush, mesh).with_batching(self.config.batching.clone()),
                )?;

                if self.handles.is_empty() {
                    self.pass_started = Some(Instant::now());
                }
                self.handles.push(handle);
                Ok(true)
            }
        }
    }

    /// Poll every in-flight job once, merging the finished ones.
    ///
    /// Returns the number of jobs completed by this call. A lost worker is
    /// reported after every other job has been polled; its handle is dropped.
    pub fn update(&mut self) -> Result<usize, PaintError> {
        let mut completed = 0;
        let mut first_error = None;

        self.handles.retain_mut(|handle| match handle.poll() {
            Ok(true) => {
                completed += 1;
                false
            }
            Ok(false) => true,
            Err(err) => {
                first_error.get_or_insert(err);
                false
            }
        });

        self.completed_jobs += completed;
        self.end_pass_if_idle();
        first_error.map_or(Ok(completed), Err)
    }

    /// Block until every in-flight job has completed.
    pub fn complete_all(&mut self) -> Result<(), PaintError> {
        let mut first_error = None;
        for mut handle in self.handles.drain(..) {
            match handle.force_complete() {
                Ok(()) => self.completed_jobs += 1,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        self.end_pass_if_idle();
        first_error.map_or(Ok(()), Err)
    }

    fn end_pass_if_idle(&mut self) {
        if !self.handles.is_empty() {
            return;
        }
        if let Some(started) = self.pass_started.take() {
            log::info!("Paint pass finished in {:?}", started.elapsed());
        }
    }

    /// Whether `mesh` has a job that has not been merged yet.
    pub fn is_in_flight(&self, mesh: MeshId) -> bool {
        self.handles
            .iter()
            .any(|h| h.mesh_id() == Some(mesh) && !h.is_completed())
    }

    /// Number of jobs not merged yet.
    pub fn in_flight(&self) -> usize {
        self.handles.len()
    }

    /// Total number of completed paint operations, both modes.
    pub fn completed_jobs(&self) -> usize {
        self.completed_jobs
    }

    pub fn config(&self) -> &PainterConfig {
        &self.config
    }

    pub fn mode(&self) -> PaintMode {
        self.config.mode
    }

    /// Switch execution mode. Jobs already in flight are unaffected.
    pub fn set_mode(&mut self, mode: PaintMode) {
        self.config.mode = mode;
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.config.brush
    }

    /// Direct access to the brush. Radii are validated when painting.
    pub fn brush_mut(&mut self) -> &mut BrushSettings {
        &mut self.config.brush
    }

    /// Replace the brush, forcing its radii into range first.
    pub fn set_brush(&mut self, brush: BrushSettings) {
        self.config.brush = brush.sanitized();
    }

    /// Move the brush. Jobs already in flight keep their snapshot.
    pub fn set_brush_position(&mut self, position: Vec3) {
        self.config.brush.position = position;
    }

    pub fn cache(&self) -> &VertexPositionCache {
        &self.cache
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl<M: PaintableMesh + 'static> Drop for Painter<M> {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        log::debug!("Completing {} paint jobs before teardown", self.handles.len());
        if let Err(err) = self.complete_all() {
            log::warn!("Paint job failed during teardown: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::shared;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use vcpaint_core::color::Color;
    use vcpaint_core::mesh::generators::generate_quad;

    struct AllMeshes(Vec<SharedMesh>);

    impl SpatialQuery<CpuMesh> for AllMeshes {
        fn overlap_sphere(&self, _center: &Vec3, _radius: f32) -> Vec<SharedMesh> {
            self.0.clone()
        }
    }

    fn config() -> PainterConfig {
        PainterConfig::default()
            .with_num_threads(2)
            .with_brush(BrushSettings::default().with_radii(0.0, 1.0))
    }

    fn drain(painter: &mut Painter) {
        while painter.in_flight() > 0 {
            painter.update().unwrap();
            std::thread::yield_now();
        }
    }

    #[test]
    fn test_paint_schedules_one_job_per_mesh() {
        let mut painter = Painter::new(config()).unwrap();
        let scene = AllMeshes(vec![
            shared(generate_quad(0.5, 0.5)),
            shared(generate_quad(1.0, 1.0)),
        ]);

        assert_eq!(painter.paint(&scene), Ok(2));
        drain(&mut painter);

        assert_eq!(painter.completed_jobs(), 2);
        assert_eq!(painter.cache().len(), 2);
        for mesh in &scene.0 {
            assert_eq!(mesh.read().colors().map(<[Color]>::len), Some(4));
        }
    }

    #[test]
    fn test_mesh_in_flight_is_skipped() {
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let (release, gate) = mpsc::channel::<()>();
        pool.spawn(move || {
            let _ = gate.recv();
        });

        let mut painter = Painter::with_pool(config(), pool);
        let mesh = shared(generate_quad(0.5, 0.5));
        let id = mesh.read().id();

        assert_eq!(painter.paint_mesh(mesh.clone()), Ok(true));
        assert!(painter.is_in_flight(id));
        assert_eq!(painter.paint_mesh(mesh.clone()), Ok(false));
        assert_eq!(painter.in_flight(), 1);
        assert_eq!(painter.update(), Ok(0));

        release.send(()).unwrap();
        painter.complete_all().unwrap();
        assert!(!painter.is_in_flight(id));
        assert_eq!(painter.completed_jobs(), 1);

        // Once merged, the mesh can be painted again.
        assert_eq!(painter.paint_mesh(mesh), Ok(true));
    }

    #[test]
    fn test_zero_outer_radius_paints_nothing() {
        let mut painter = Painter::new(config()).unwrap();
        painter.brush_mut().inner_radius = 0.0;
        painter.brush_mut().outer_radius = 0.0;
        let mesh = shared(generate_quad(0.5, 0.5));

        assert_eq!(painter.paint(&AllMeshes(vec![mesh.clone()])), Ok(0));
        assert_eq!(painter.paint_mesh(mesh.clone()), Ok(false));
        assert_eq!(painter.in_flight(), 0);
        assert!(mesh.read().colors().is_none());
    }

    #[test]
    fn test_invalid_radii_are_rejected() {
        let mut painter = Painter::new(config()).unwrap();
        painter.brush_mut().inner_radius = 2.0;
        let mesh = shared(generate_quad(0.5, 0.5));

        assert_eq!(
            painter.paint(&AllMeshes(vec![mesh.clone()])),
            Err(PaintError::InvalidRadii {
                inner: 2.0,
                outer: 1.0
            })
        );
        assert_eq!(painter.in_flight(), 0);
        assert!(mesh.read().colors().is_none());
    }

    #[test]
    fn test_negative_outer_radius_is_rejected() {
        let expected = PaintError::InvalidRadii {
            inner: 0.5,
            outer: -1.0,
        };
        for mode in [PaintMode::Parallel, PaintMode::SingleThreaded] {
            let mut painter = Painter::new(config().with_mode(mode)).unwrap();
            painter.brush_mut().inner_radius = 0.5;
            painter.brush_mut().outer_radius = -1.0;
            let mesh = shared(generate_quad(0.5, 0.5));

            assert_eq!(painter.paint_mesh(mesh.clone()), Err(expected.clone()));
            assert_eq!(
                painter.paint(&AllMeshes(vec![mesh.clone()])),
                Err(expected.clone())
            );
            assert_eq!(painter.in_flight(), 0);
            assert!(mesh.read().colors().is_none());
        }
    }

    #[test]
    fn test_set_brush_sanitizes() {
        let mut painter = Painter::<CpuMesh>::new(config()).unwrap();
        painter.set_brush(BrushSettings::default().with_radii(5.0, 2.0));
        assert_eq!(painter.brush().inner_radius, 2.0);
        assert_eq!(painter.brush().outer_radius, 2.0);
    }

    #[test]
    fn test_single_threaded_paints_immediately() {
        let mut painter = Painter::new(config().with_mode(PaintMode::SingleThreaded)).unwrap();
        let mesh = shared(generate_quad(0.5, 0.5));

        assert_eq!(painter.paint_mesh(mesh.clone()), Ok(true));
        assert_eq!(painter.in_flight(), 0);
        assert_eq!(painter.completed_jobs(), 1);
        assert!(painter.cache().is_empty());
        assert_eq!(mesh.read().colors().map(<[Color]>::len), Some(4));
    }

    #[test]
    fn test_observer_sees_each_job_once() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut painter = Painter::<CpuMesh>::new(config()).unwrap();
        let counter = seen.clone();
        painter.on_job_completed(move |handle| {
            assert!(handle.is_completed());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let scene = AllMeshes((0..3).map(|_| shared(generate_quad(0.5, 0.5))).collect());
        painter.paint(&scene).unwrap();
        drain(&mut painter);
        painter.update().unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_drop_completes_in_flight_jobs() {
        let mesh = shared(generate_quad(0.5, 0.5));
        {
            let mut painter = Painter::new(config()).unwrap();
            painter.paint_mesh(mesh.clone()).unwrap();
        }
        assert_eq!(mesh.read().colors().map(<[Color]>::len), Some(4));
    }
}
