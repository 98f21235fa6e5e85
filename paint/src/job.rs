//! Paint job handles.
//!
//! A [`PaintJobHandle`] drives one paint operation on one mesh from start to
//! merged result:
//!
//! ```text
//! Idle --start--> Scheduled --dispatch--> Running --poll/force_complete--> Completed
//! ```
//!
//! Handles are one-shot. After `Completed` the mesh holds the painted colors,
//! the completion callback has run, and the handle can only be queried and
//! dropped.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use vcpaint_core::color::Color;
use vcpaint_core::mesh::MeshId;

use crate::batch::{BatchConfig, BatchJob, BatchStatus, partition};
use crate::brush::BrushSettings;
use crate::cache::VertexPositionCache;
use crate::error::PaintError;
use crate::target::{MeshGeometry, PaintableMesh, SharedMesh};
use crate::worker_pool::WorkerPool;

/// Lifecycle state of a [`PaintJobHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created, not started.
    Idle,
    /// Snapshots taken and batches built, not yet handed to workers.
    Scheduled,
    /// Batches are on the worker pool.
    Running,
    /// Results merged (or the worker was lost). Terminal.
    Completed,
}

/// Inputs of one paint operation.
pub struct PaintArgs<M> {
    /// Brush parameters; a snapshot is taken at start.
    pub brush: BrushSettings,
    /// The mesh to paint.
    pub mesh: SharedMesh<M>,
    /// How to split the mesh into batches.
    pub batching: BatchConfig,
}

impl<M> PaintArgs<M> {
    pub fn new(brush: BrushSettings, mesh: SharedMesh<M>) -> Self {
        Self {
            brush,
            mesh,
            batching: BatchConfig::default(),
        }
    }

    /// Set the batching configuration.
    pub fn with_batching(mut self, batching: BatchConfig) -> Self {
        self.batching = batching;
        self
    }
}

/// Callback run once when a handle completes.
pub type CompletionCallback<M> = Box<dyn FnOnce(&PaintJobHandle<M>) + Send>;

/// Lifecycle of one paint operation on one mesh.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vcpaint::{
///     BrushSettings, PaintArgs, PaintJobHandle, VertexPositionCache, WorkerPool, shared,
/// };
/// use vcpaint_core::mesh::generators::generate_quad;
///
/// let pool = Arc::new(WorkerPool::new(2).unwrap());
/// let cache = Arc::new(VertexPositionCache::new());
/// let mesh = shared(generate_quad(0.5, 0.5));
///
/// let mut handle = PaintJobHandle::new(pool, cache);
/// handle.start(PaintArgs::new(BrushSettings::default(), mesh.clone())).unwrap();
///
/// // Blocking; a frame loop would call `poll()` once per tick instead.
/// handle.force_complete().unwrap();
/// assert!(handle.is_completed());
/// assert_eq!(mesh.read().colors().map(|c| c.len()), Some(4));
/// ```
pub struct PaintJobHandle<M> {
    state: JobState,
    pool: Arc<WorkerPool>,
    cache: Arc<VertexPositionCache>,
    mesh: Option<SharedMesh<M>>,
    mesh_id: Option<MeshId>,
    batches: Vec<BatchStatus>,
    /// Delivers the color buffer once every batch has finished.
    pending: Option<mpsc::Receiver<Vec<Color>>>,
    on_completed: Option<CompletionCallback<M>>,
    started_at: Option<Instant>,
    elapsed: Option<Duration>,
}

impl<M: PaintableMesh> PaintJobHandle<M> {
    /// Create an idle handle that will run on `pool` and read positions
    /// through `cache`.
    pub fn new(pool: Arc<WorkerPool>, cache: Arc<VertexPositionCache>) -> Self {
        Self {
            state: JobState::Idle,
            pool,
            cache,
            mesh: None,
            mesh_id: None,
            batches: Vec::new(),
            pending: None,
            on_completed: None,
            started_at: None,
            elapsed: None,
        }
    }

    /// Register the completion callback, replacing any previous one.
    ///
    /// It runs exactly once, after the painted colors were merged into the
    /// mesh, whether completion was observed by [`poll`](Self::poll) or
    /// forced by [`force_complete`](Self::force_complete).
    pub fn on_completed(&mut self, callback: impl FnOnce(&Self) + Send + 'static) {
        self.on_completed = Some(Box::new(callback));
    }

    /// Snapshot the brush and mesh, and dispatch the batches.
    ///
    /// A missing color attribute, or one whose length differs from the
    /// vertex count, is replaced by a zero-filled one first. The mesh's
    /// write lock is held only while snapshotting.
    ///
    /// Fails without side effects if the handle was already started or the
    /// brush radii are invalid.
    pub fn start(&mut self, args: PaintArgs<M>) -> Result<(), PaintError> {
        if self.state != JobState::Idle {
            return Err(PaintError::AlreadyStarted { state: self.state });
        }
        let brush = args.brush.snapshot()?;

        let (geometry, buffer) = {
            let mut mesh = args.mesh.write();
            let id = mesh.mesh_id();
            let vertex_count = mesh.vertex_count();

            let existing = mesh
                .colors()
                .filter(|colors| colors.len() == vertex_count)
                .map(<[Color]>::to_vec);
            let buffer = match existing {
                Some(buffer) => buffer,
                None => {
                    log::debug!("Reallocating color attribute of {id} ({vertex_count} vertices)");
                    let buffer = vec![Color::TRANSPARENT; vertex_count];
                    mesh.set_colors(buffer.clone());
                    buffer
                }
            };

            let positions = self.cache.get_or_create(id, || mesh.vertex_positions());
            let geometry = Arc::new(MeshGeometry {
                id,
                vertex_count,
                local_to_world: mesh.local_to_world(),
                positions,
            });
            (geometry, buffer)
        };

        let workers = args
            .batching
            .effective_workers(geometry.vertex_count, self.pool.num_threads());
        let batches: Vec<BatchJob> = partition(geometry.vertex_count, workers)
            .into_iter()
            .map(|range| BatchJob::new(range, brush, geometry.clone()))
            .collect();

        self.mesh_id = Some(geometry.id);
        self.mesh = Some(args.mesh);
        self.batches = batches.iter().map(|batch| batch.status().clone()).collect();
        self.state = JobState::Scheduled;

        log::debug!(
            "Dispatching {} batches for {} ({} vertices)",
            batches.len(),
            geometry.id,
            geometry.vertex_count
        );
        self.started_at = Some(Instant::now());
        self.pending = Some(self.pool.spawn_batches(buffer, batches));
        self.state = JobState::Running;
        Ok(())
    }

    /// Check for completion without blocking.
    ///
    /// Once every batch has finished, merges the painted colors into the
    /// mesh, runs the completion callback and returns `Ok(true)`. Returns
    /// `Ok(false)` while work is outstanding or before [`start`](Self::start).
    /// Safe to call on every tick, including after completion.
    ///
    /// The caller must not hold a lock on the target mesh.
    pub fn poll(&mut self) -> Result<bool, PaintError> {
        if self.state != JobState::Running {
            return Ok(self.state == JobState::Completed);
        }
        let (Some(receiver), Some(mesh)) = (self.pending.as_ref(), self.mesh_id) else {
            return Ok(false);
        };

        match receiver.try_recv() {
            Ok(buffer) => {
                self.finish(buffer);
                Ok(true)
            }
            Err(mpsc::TryRecvError::Empty) => Ok(false),
            Err(mpsc::TryRecvError::Disconnected) => Err(self.lose_worker(mesh)),
        }
    }

    /// Block until every batch has finished, then merge and notify like
    /// [`poll`](Self::poll).
    ///
    /// Does nothing on a handle that is completed or was never started.
    /// There is no way to abandon running batches; this is the teardown path.
    pub fn force_complete(&mut self) -> Result<(), PaintError> {
        if self.state != JobState::Running {
            return Ok(());
        }
        let (Some(receiver), Some(mesh)) = (self.pending.take(), self.mesh_id) else {
            return Ok(());
        };

        match receiver.recv() {
            Ok(buffer) => {
                self.finish(buffer);
                Ok(())
            }
            Err(mpsc::RecvError) => Err(self.lose_worker(mesh)),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == JobState::Completed
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Identity of the target mesh, once started.
    pub fn mesh_id(&self) -> Option<MeshId> {
        self.mesh_id
    }

    /// The target mesh, once started.
    pub fn mesh(&self) -> Option<&SharedMesh<M>> {
        self.mesh.as_ref()
    }

    /// Number of batches the mesh was split into.
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Number of batches that have finished painting.
    pub fn finished_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.is_finished()).count()
    }

    /// Time from dispatch to completion, or so far if still running.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
            .or_else(|| self.started_at.map(|started| started.elapsed()))
    }

    fn finish(&mut self, buffer: Vec<Color>) {
        debug_assert!(self.batches.iter().all(BatchStatus::is_finished));

        self.state = JobState::Completed;
        self.pending = None;
        self.elapsed = self.started_at.map(|started| started.elapsed());
        if let Some(mesh) = &self.mesh {
            mesh.write().set_colors(buffer);
        }

        if let (Some(id), Some(elapsed)) = (self.mesh_id, self.elapsed) {
            log::debug!("Paint job for {id} completed in {elapsed:?}");
        }
        if let Some(callback) = self.on_completed.take() {
            callback(&*self);
        }
    }

    fn lose_worker(&mut self, mesh: MeshId) -> PaintError {
        log::error!("Paint worker for {mesh} was lost; colors were not merged");
        self.state = JobState::Completed;
        self.pending = None;
        self.on_completed = None;
        PaintError::WorkerLost { mesh }
    }
}

impl<M> fmt::Debug for PaintJobHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintJobHandle")
            .field("state", &self.state)
            .field("mesh_id", &self.mesh_id)
            .field("batches", &self.batches.len())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::shared;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vcpaint_core::math::Vec3;
    use vcpaint_core::mesh::CpuMesh;

    fn setup(threads: usize) -> (Arc<WorkerPool>, Arc<VertexPositionCache>) {
        (
            Arc::new(WorkerPool::new(threads).unwrap()),
            Arc::new(VertexPositionCache::new()),
        )
    }

    fn line_mesh(vertex_count: usize) -> CpuMesh {
        CpuMesh::new(
            (0..vertex_count)
                .map(|i| Vec3::new(i as f32 * 0.01, 0.0, 0.0))
                .collect(),
        )
    }

    fn brush() -> BrushSettings {
        BrushSettings::default()
            .with_colors(Color::RED, Color::BLUE)
            .with_radii(0.0, 1.0)
    }

    fn poll_until_done(handle: &mut PaintJobHandle<CpuMesh>) {
        while !handle.poll().unwrap() {
            std::thread::yield_now();
        }
    }

    /// Occupy every thread of a single-threaded pool until the returned
    /// sender is used or dropped.
    fn block_pool(pool: &WorkerPool) -> mpsc::Sender<()> {
        let (release, gate) = mpsc::channel::<()>();
        pool.spawn(move || {
            let _ = gate.recv();
        });
        release
    }

    #[test]
    fn test_new_handle_is_idle() {
        let (pool, cache) = setup(1);
        let mut handle = PaintJobHandle::<CpuMesh>::new(pool, cache);
        assert_eq!(handle.state(), JobState::Idle);
        assert!(!handle.is_completed());
        assert_eq!(handle.poll(), Ok(false));
        assert_eq!(handle.force_complete(), Ok(()));
        assert_eq!(handle.state(), JobState::Idle);
        assert!(handle.mesh_id().is_none());
    }

    #[test]
    fn test_poll_completes_and_merges() {
        let (pool, cache) = setup(4);
        let mesh = shared(line_mesh(500));
        let mut handle = PaintJobHandle::new(pool, cache);

        handle
            .start(PaintArgs::new(brush(), mesh.clone()).with_batching(BatchConfig {
                min_batch_size: 1,
                max_workers: Some(4),
            }))
            .unwrap();
        assert_eq!(handle.batch_count(), 4);

        poll_until_done(&mut handle);

        assert!(handle.is_completed());
        assert_eq!(handle.finished_batches(), 4);
        assert!(handle.elapsed().is_some());
        let mesh = mesh.read();
        let colors = mesh.colors().unwrap();
        assert_eq!(colors.len(), 500);
        assert_eq!(colors[0], Color::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_not_completed_until_batches_finish() {
        let (pool, cache) = setup(1);
        let release = block_pool(&pool);
        let mesh = shared(line_mesh(10));
        let mut handle = PaintJobHandle::new(pool, cache);
        handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();

        for _ in 0..10 {
            assert_eq!(handle.poll(), Ok(false));
            assert_eq!(handle.state(), JobState::Running);
            assert!(!handle.is_completed());
        }
        assert_eq!(handle.finished_batches(), 0);
        // Only the repaired, unpainted attribute is visible so far.
        assert_eq!(
            mesh.read().colors(),
            Some(&[Color::TRANSPARENT; 10][..])
        );

        release.send(()).unwrap();
        poll_until_done(&mut handle);
        assert!(handle.is_completed());

        // Completion is sticky.
        assert_eq!(handle.poll(), Ok(true));
        assert!(handle.is_completed());
    }

    #[test]
    fn test_callback_fires_once_on_poll() {
        let (pool, cache) = setup(2);
        let fired = Arc::new(AtomicUsize::new(0));
        let mesh = shared(line_mesh(100));
        let mut handle = PaintJobHandle::new(pool, cache);

        let counter = fired.clone();
        handle.on_completed(move |h| {
            assert!(h.is_completed());
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.start(PaintArgs::new(brush(), mesh)).unwrap();

        poll_until_done(&mut handle);
        handle.poll().unwrap();
        handle.force_complete().unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_complete_merges_and_notifies() {
        let (pool, cache) = setup(1);
        let release = block_pool(&pool);
        let fired = Arc::new(AtomicUsize::new(0));
        let mesh = shared(line_mesh(10));
        let mut handle = PaintJobHandle::new(pool, cache);

        let counter = fired.clone();
        handle.on_completed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();

        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            release.send(()).unwrap();
        });
        handle.force_complete().unwrap();
        releaser.join().unwrap();

        assert!(handle.is_completed());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(mesh.read().colors().unwrap()[0].rgb(), Color::RED.rgb());

        handle.force_complete().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (pool, cache) = setup(1);
        let mesh = shared(line_mesh(4));
        let mut handle = PaintJobHandle::new(pool, cache);
        handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();

        let err = handle.start(PaintArgs::new(brush(), mesh.clone()));
        assert_eq!(
            err,
            Err(PaintError::AlreadyStarted {
                state: JobState::Running
            })
        );

        handle.force_complete().unwrap();
        let err = handle.start(PaintArgs::new(brush(), mesh));
        assert_eq!(
            err,
            Err(PaintError::AlreadyStarted {
                state: JobState::Completed
            })
        );
    }

    #[test]
    fn test_invalid_radii_leave_handle_idle() {
        let (pool, cache) = setup(1);
        let mesh = shared(line_mesh(4));
        let mut handle = PaintJobHandle::new(pool, cache.clone());

        let err = handle.start(PaintArgs::new(brush().with_radii(1.0, 1.0), mesh.clone()));
        assert_eq!(
            err,
            Err(PaintError::InvalidRadii {
                inner: 1.0,
                outer: 1.0
            })
        );
        assert_eq!(handle.state(), JobState::Idle);
        assert!(mesh.read().colors().is_none());
        assert!(cache.is_empty());

        // The handle is still usable with valid arguments.
        handle.start(PaintArgs::new(brush(), mesh)).unwrap();
        handle.force_complete().unwrap();
        assert!(handle.is_completed());
    }

    #[test]
    fn test_empty_mesh_completes_on_first_poll() {
        let (pool, cache) = setup(1);
        let mesh = shared(CpuMesh::new(Vec::new()));
        let mut handle = PaintJobHandle::new(pool, cache);
        handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();

        assert_eq!(handle.batch_count(), 0);
        assert_eq!(handle.poll(), Ok(true));
        assert_eq!(mesh.read().colors(), Some(&[][..]));
    }

    #[test]
    fn test_mismatched_colors_are_reallocated() {
        let (pool, cache) = setup(2);
        let mesh = shared(line_mesh(8).with_colors(vec![Color::WHITE; 3]));
        let mut handle = PaintJobHandle::new(pool, cache);
        handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();
        handle.force_complete().unwrap();

        let mesh = mesh.read();
        let colors = mesh.colors().unwrap();
        assert_eq!(colors.len(), 8);
        assert!(colors.iter().all(|c| c.a == 0.0));
    }

    /// Keeps at most `limit` colors of whatever it is given.
    struct TruncatingMesh {
        inner: CpuMesh,
        limit: usize,
    }

    impl PaintableMesh for TruncatingMesh {
        fn mesh_id(&self) -> MeshId {
            self.inner.id()
        }

        fn vertex_count(&self) -> usize {
            self.inner.vertex_count()
        }

        fn vertex_positions(&self) -> Vec<Vec3> {
            self.inner.positions().to_vec()
        }

        fn local_to_world(&self) -> vcpaint_core::math::Mat4 {
            *self.inner.transform()
        }

        fn colors(&self) -> Option<&[Color]> {
            self.inner.colors()
        }

        fn set_colors(&mut self, mut colors: Vec<Color>) {
            colors.truncate(self.limit);
            self.inner.set_colors(colors);
        }
    }

    #[test]
    fn test_painted_buffer_matches_vertex_count() {
        let (pool, cache) = setup(2);
        let mesh = shared(TruncatingMesh {
            inner: line_mesh(8),
            limit: 3,
        });
        let mut handle = PaintJobHandle::new(pool, cache);
        handle
            .start(PaintArgs::new(brush(), mesh.clone()).with_batching(BatchConfig {
                min_batch_size: 1,
                max_workers: Some(2),
            }))
            .unwrap();
        assert_eq!(handle.batch_count(), 2);

        assert_eq!(handle.force_complete(), Ok(()));
        assert!(handle.is_completed());
        assert_eq!(handle.finished_batches(), 2);
        let mesh = mesh.read();
        let colors = mesh.colors().unwrap();
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0].rgb(), Color::RED.rgb());
    }

    #[test]
    fn test_existing_alpha_is_preserved() {
        let (pool, cache) = setup(2);
        let mesh = shared(line_mesh(8).with_colors(vec![Color::new(0.0, 0.0, 0.0, 0.75); 8]));
        let mut handle = PaintJobHandle::new(pool, cache);
        handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();
        handle.force_complete().unwrap();

        assert!(mesh.read().colors().unwrap().iter().all(|c| c.a == 0.75));
    }

    #[test]
    fn test_handles_share_cached_positions() {
        let (pool, cache) = setup(2);
        let mesh = shared(line_mesh(16));

        for _ in 0..3 {
            let mut handle = PaintJobHandle::new(pool.clone(), cache.clone());
            handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();
            handle.force_complete().unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(mesh.read().id()));
    }

    #[test]
    fn test_lost_worker_completes_without_merge() {
        let (pool, cache) = setup(1);
        let mesh = shared(line_mesh(4));
        let id = mesh.read().id();
        let mut handle = PaintJobHandle::new(pool, cache);
        handle.on_completed(|_| panic!("callback must not run for a lost worker"));
        handle.start(PaintArgs::new(brush(), mesh.clone())).unwrap();

        // Simulate a worker that went away without sending the buffer.
        let (_, disconnected) = mpsc::channel();
        handle.pending = Some(disconnected);

        assert_eq!(handle.poll(), Err(PaintError::WorkerLost { mesh: id }));
        assert_eq!(handle.state(), JobState::Completed);
        assert_eq!(handle.poll(), Ok(true));
        assert_eq!(mesh.read().colors(), Some(&[Color::TRANSPARENT; 4][..]));
    }
}
