//! Batch jobs: the kernel bound to a contiguous range of one mesh's vertices.
//!
//! A job's vertex range `[0, vertex_count)` is split by [`partition`] into
//! disjoint, contiguous ranges. Each [`BatchJob`] writes only into the window
//! of the color buffer matching its range, so sibling batches can run
//! concurrently on one buffer without locks.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use vcpaint_core::color::Color;

use crate::brush::BrushState;
use crate::kernel;
use crate::target::MeshGeometry;

/// Configuration for splitting a mesh into batches.
///
/// Use [`Default::default()`] for sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Minimum number of vertices per batch. Prevents scheduling overhead
    /// from dominating for small meshes. Default: 64.
    pub min_batch_size: usize,
    /// Maximum number of batches per mesh. `None` uses the worker pool's
    /// thread count. Default: `None`.
    pub max_workers: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 64,
            max_workers: None,
        }
    }
}

impl BatchConfig {
    /// Number of batches to split `vertex_count` vertices into, given
    /// `pool_threads` available workers. Always at least one.
    pub fn effective_workers(&self, vertex_count: usize, pool_threads: usize) -> usize {
        let workers = self.max_workers.unwrap_or(pool_threads);
        let by_size = vertex_count / self.min_batch_size.max(1);
        workers.min(by_size).max(1)
    }
}

/// Split `[0, vertex_count)` into `num_workers` contiguous ranges.
///
/// Every range holds `vertex_count / num_workers` vertices and the last one
/// also takes the remainder. The ranges are in order, disjoint, and cover
/// every index exactly once. Zero vertices give zero ranges; zero workers
/// are treated as one.
pub fn partition(vertex_count: usize, num_workers: usize) -> Vec<Range<usize>> {
    if vertex_count == 0 {
        return Vec::new();
    }

    let num_workers = num_workers.max(1);
    let per_worker = vertex_count / num_workers;
    let remainder = vertex_count % num_workers;

    (0..num_workers)
        .map(|worker| {
            let start = worker * per_worker;
            let mut end = start + per_worker;
            if worker + 1 == num_workers {
                end += remainder;
            }
            start..end
        })
        .collect()
}

/// Progress of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatchState {
    Queued = 0,
    Running = 1,
    Finished = 2,
}

/// Shared view of a batch's [`BatchState`].
///
/// The batch updates it while executing; its job handle reads it.
#[derive(Debug, Clone)]
pub struct BatchStatus(Arc<AtomicU8>);

impl BatchStatus {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(BatchState::Queued as u8)))
    }

    pub fn state(&self) -> BatchState {
        match self.0.load(Ordering::Acquire) {
            0 => BatchState::Queued,
            1 => BatchState::Running,
            _ => BatchState::Finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state() == BatchState::Finished
    }

    fn set(&self, state: BatchState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// One unit of paint work: a vertex range of one mesh under one brush snapshot.
#[derive(Debug)]
pub struct BatchJob {
    range: Range<usize>,
    brush: BrushState,
    geometry: Arc<MeshGeometry>,
    status: BatchStatus,
}

impl BatchJob {
    pub fn new(range: Range<usize>, brush: BrushState, geometry: Arc<MeshGeometry>) -> Self {
        Self {
            range,
            brush,
            geometry,
            status: BatchStatus::new(),
        }
    }

    /// Vertex indices this batch paints.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn status(&self) -> &BatchStatus {
        &self.status
    }

    /// Paint every vertex in the range.
    ///
    /// `window` is the slice of the color buffer for this batch's range:
    /// `window[i]` holds the color of vertex `range.start + i`. Only RGB is
    /// written. Vertices past the end of the cached positions (a stale cache)
    /// keep their color.
    pub fn execute(&self, window: &mut [Color]) {
        debug_assert_eq!(window.len(), self.range.len());
        self.status.set(BatchState::Running);

        let geometry = &*self.geometry;
        let positions = geometry
            .positions
            .get(self.range.start..)
            .unwrap_or_default();
        for (slot, vertex) in window.iter_mut().zip(positions) {
            *slot = kernel::paint_vertex(*slot, vertex, &geometry.local_to_world, &self.brush);
        }

        self.status.set(BatchState::Finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushSettings;
    use crate::cache::VertexPositions;
    use rstest::rstest;
    use vcpaint_core::math::{Mat4, Vec3};
    use vcpaint_core::mesh::MeshId;

    fn assert_exact_cover(ranges: &[Range<usize>], vertex_count: usize) {
        let mut next = 0;
        for range in ranges {
            assert_eq!(range.start, next, "gap or overlap in {ranges:?}");
            assert!(range.start <= range.end);
            next = range.end;
        }
        assert_eq!(next, vertex_count, "ranges {ranges:?} do not reach the end");
    }

    #[rstest]
    #[case(0, 1)]
    #[case(0, 8)]
    #[case(1, 1)]
    #[case(1, 4)]
    #[case(3, 4)]
    #[case(4, 2)]
    #[case(10, 3)]
    #[case(1000, 7)]
    #[case(1023, 16)]
    fn test_partition_covers_range_exactly(#[case] vertex_count: usize, #[case] workers: usize) {
        let ranges = partition(vertex_count, workers);
        assert_exact_cover(&ranges, vertex_count);
        if vertex_count == 0 {
            assert!(ranges.is_empty());
        } else {
            assert_eq!(ranges.len(), workers);
        }
    }

    #[test]
    fn test_partition_last_takes_remainder() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_partition_two_workers_four_vertices() {
        assert_eq!(partition(4, 2), vec![0..2, 2..4]);
    }

    #[test]
    fn test_partition_zero_workers_is_one() {
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_effective_workers() {
        let config = BatchConfig::default();
        assert_eq!(config.effective_workers(0, 8), 1);
        assert_eq!(config.effective_workers(10, 8), 1);
        assert_eq!(config.effective_workers(64 * 3, 8), 3);
        assert_eq!(config.effective_workers(64 * 100, 8), 8);

        let config = BatchConfig {
            min_batch_size: 1,
            max_workers: Some(2),
        };
        assert_eq!(config.effective_workers(4, 8), 2);

        let config = BatchConfig {
            min_batch_size: 0,
            max_workers: None,
        };
        assert_eq!(config.effective_workers(3, 4), 3);
    }

    fn line_geometry(vertex_count: usize) -> Arc<MeshGeometry> {
        let positions: Vec<Vec3> = (0..vertex_count)
            .map(|i| Vec3::new(i as f32, 0.0, 0.0))
            .collect();
        Arc::new(MeshGeometry {
            id: MeshId::new_unique(),
            vertex_count,
            local_to_world: Mat4::identity(),
            positions: VertexPositions::new(positions),
        })
    }

    #[test]
    fn test_execute_writes_only_its_window() {
        let geometry = line_geometry(4);
        let brush = BrushSettings::default()
            .with_colors(Color::RED, Color::BLUE)
            .with_radii(0.0, 1.0)
            .snapshot()
            .unwrap();
        let sentinel = Color::new(9.0, 9.0, 9.0, 0.5);
        let mut buffer = vec![sentinel; 4];

        let batch = BatchJob::new(2..4, brush, geometry);
        assert_eq!(batch.status().state(), BatchState::Queued);
        batch.execute(&mut buffer[2..4]);

        assert!(batch.status().is_finished());
        assert_eq!(&buffer[..2], &[sentinel, sentinel]);
        // Vertex 2 is at distance 2: weight 4.
        assert_eq!(buffer[2], Color::new(-3.0, 0.0, 4.0, 0.5));
        assert_eq!(buffer[3].a, 0.5);
    }

    #[test]
    fn test_execute_with_stale_short_cache() {
        let mut geometry = (*line_geometry(2)).clone();
        geometry.vertex_count = 4;
        let brush = BrushSettings::default()
            .with_radii(0.0, 1.0)
            .snapshot()
            .unwrap();
        let mut buffer = vec![Color::TRANSPARENT; 4];

        let batch = BatchJob::new(0..4, brush, Arc::new(geometry));
        batch.execute(&mut buffer);

        assert!(batch.status().is_finished());
        assert_ne!(buffer[0], Color::TRANSPARENT);
        assert_eq!(&buffer[2..], &[Color::TRANSPARENT; 2]);
    }
}
