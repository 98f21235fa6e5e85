use std::sync::mpsc;

use vcpaint_core::color::Color;

use crate::batch::BatchJob;
use crate::error::PaintError;

/// A bounded pool of worker threads running paint batches.
///
/// Batches of one job are handed over together with the job's color buffer
/// through [`spawn_batches`](WorkerPool::spawn_batches). They run as
/// independent tasks on the pool, each on its own disjoint window of the
/// buffer, and the buffer comes back through a channel once all of them have
/// finished. Callers never block unless they choose to wait on that channel.
///
/// # Example
///
/// ```
/// use vcpaint::WorkerPool;
///
/// let pool = WorkerPool::new(2).unwrap();
/// let (tx, rx) = std::sync::mpsc::channel();
/// pool.spawn(move || tx.send(42u32).unwrap());
/// assert_eq!(rx.recv(), Ok(42));
/// ```
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Creates a new pool with the given number of worker threads (at least one).
    pub fn new(num_threads: usize) -> Result<Self, PaintError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .thread_name(|index| format!("vcpaint-worker-{index}"))
            .panic_handler(|_| log::error!("Paint worker task panicked"))
            .build()
            .map_err(|err| PaintError::WorkerPool(err.to_string()))?;
        Ok(Self { pool })
    }

    /// Creates a pool sized to the number of available CPU cores.
    pub fn default_threads() -> Result<Self, PaintError> {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs an arbitrary task on the pool without waiting for it.
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(f);
    }

    /// Runs `batches` over `buffer` in parallel and returns the buffer
    /// through the returned receiver once every batch has finished.
    ///
    /// `batches` must be the in-order ranges produced by
    /// [`partition`](crate::partition) for `buffer.len()` vertices. With no
    /// batches the buffer is sent back immediately.
    ///
    /// If a batch panics, the sender is dropped and the receiver reports
    /// disconnection instead of a buffer.
    pub fn spawn_batches(
        &self,
        buffer: Vec<Color>,
        batches: Vec<BatchJob>,
    ) -> mpsc::Receiver<Vec<Color>> {
        let (sender, receiver) = mpsc::channel();

        if batches.is_empty() {
            let _ = sender.send(buffer);
            return receiver;
        }

        self.pool.spawn(move || {
            let mut buffer = buffer;
            rayon::scope(|scope| {
                let mut rest: &mut [Color] = &mut buffer;
                for batch in &batches {
                    let (window, tail) = std::mem::take(&mut rest).split_at_mut(batch.len());
                    rest = tail;
                    scope.spawn(move |_| batch.execute(window));
                }
            });
            let _ = sender.send(buffer);
        });

        receiver
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}
