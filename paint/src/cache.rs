//! Caching of extracted vertex positions.
//!
//! Extracting positions from a mesh means copying its whole vertex array,
//! which is wasted work when the same mesh is painted on every tick. The
//! [`VertexPositionCache`] keeps one shared, immutable copy per [`MeshId`].
//!
//! There is no size or eviction policy: an entry lives until
//! [`release_all`](VertexPositionCache::release_all) or an explicit
//! [`invalidate`](VertexPositionCache::invalidate). If a mesh's geometry
//! changes while it is cached, painting keeps using the old positions.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use vcpaint_core::math::Vec3;
use vcpaint_core::mesh::MeshId;

/// Shared read-only view of a mesh's cached vertex positions.
///
/// Cloning is cheap and never copies the positions.
#[derive(Clone, Debug)]
pub struct VertexPositions(Arc<[Vec3]>);

impl VertexPositions {
    /// Wrap freshly extracted positions.
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self(positions.into())
    }

    /// Whether both views refer to the same underlying array.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for VertexPositions {
    type Target = [Vec3];

    fn deref(&self) -> &[Vec3] {
        &self.0
    }
}

/// A cache with [`MeshId`] keys and [`VertexPositions`] values.
///
/// If the same mesh is requested simultaneously from different threads, the
/// extractor runs for only one of them and the others wait for its result.
#[derive(Debug, Default)]
pub struct VertexPositionCache {
    entries: Mutex<HashMap<MeshId, Arc<OnceLock<VertexPositions>>>>,
}

impl VertexPositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached positions for `mesh`, running `extractor` to fill the
    /// entry if it is not present.
    ///
    /// The map lock is released before extraction, so extracting one mesh
    /// does not block lookups of others.
    pub fn get_or_create(
        &self,
        mesh: MeshId,
        extractor: impl FnOnce() -> Vec<Vec3>,
    ) -> VertexPositions {
        let cell = self.entries.lock().entry(mesh).or_default().clone();

        cell.get_or_init(|| {
            let positions = VertexPositions::new(extractor());
            log::debug!(
                "Cached {} vertex positions for {}",
                positions.len(),
                mesh
            );
            positions
        })
        .clone()
    }

    /// Get the cached positions for `mesh` without extracting.
    pub fn get(&self, mesh: MeshId) -> Option<VertexPositions> {
        let cell = self.entries.lock().get(&mesh)?.clone();
        cell.get().cloned()
    }

    /// Whether positions for `mesh` are cached.
    pub fn contains(&self, mesh: MeshId) -> bool {
        self.get(mesh).is_some()
    }

    /// Drop the entry for `mesh`, so the next request extracts again.
    ///
    /// Views already handed out stay valid and keep the old positions.
    pub fn invalidate(&self, mesh: MeshId) -> bool {
        self.entries.lock().remove(&mesh).is_some()
    }

    /// Drop every entry.
    pub fn release_all(&self) {
        let mut entries = self.entries.lock();
        log::debug!("Releasing {} cached vertex buffers", entries.len());
        entries.clear();
    }

    /// Number of cached meshes.
    ///
    /// Entries still being extracted, or whose extractor panicked, are not
    /// counted.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
