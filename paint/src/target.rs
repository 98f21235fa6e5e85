//! The mesh-side interfaces the painter consumes.
//!
//! - [`PaintableMesh`] - access to one mesh's geometry and color attribute
//! - [`SharedMesh`] - how meshes are shared between a host and in-flight jobs
//! - [`MeshGeometry`] - the per-job geometry snapshot read by batches
//! - [`SpatialQuery`] - discovery of candidate meshes near the brush

use std::sync::Arc;

use parking_lot::RwLock;
use vcpaint_core::color::Color;
use vcpaint_core::math::{Mat4, Vec3};
use vcpaint_core::mesh::{CpuMesh, MeshId};

use crate::cache::VertexPositions;

/// Access to a mesh that can be painted.
///
/// The painter never holds a borrow of the mesh across ticks: it reads the
/// geometry and color attribute when a job starts and replaces the color
/// attribute when the job completes.
pub trait PaintableMesh {
    /// Identity used to key cached vertex positions.
    fn mesh_id(&self) -> MeshId;

    fn vertex_count(&self) -> usize;

    /// Extract a copy of the local-space vertex positions.
    ///
    /// Called at most once per identity while the cache entry lives.
    fn vertex_positions(&self) -> Vec<Vec3>;

    /// Local-to-world transform at the time of the call.
    fn local_to_world(&self) -> Mat4;

    /// Current color attribute. May be absent or of the wrong length.
    fn colors(&self) -> Option<&[Color]>;

    /// Replace the color attribute wholesale.
    fn set_colors(&mut self, colors: Vec<Color>);
}

impl PaintableMesh for CpuMesh {
    fn mesh_id(&self) -> MeshId {
        self.id()
    }

    fn vertex_count(&self) -> usize {
        CpuMesh::vertex_count(self)
    }

    fn vertex_positions(&self) -> Vec<Vec3> {
        self.positions().to_vec()
    }

    fn local_to_world(&self) -> Mat4 {
        *self.transform()
    }

    fn colors(&self) -> Option<&[Color]> {
        CpuMesh::colors(self)
    }

    fn set_colors(&mut self, colors: Vec<Color>) {
        CpuMesh::set_colors(self, colors);
    }
}

/// A mesh shared between its owner and the paint jobs targeting it.
///
/// Jobs lock it briefly when starting and when merging their results; they
/// never hold the lock while batches run.
pub type SharedMesh<M = CpuMesh> = Arc<RwLock<M>>;

/// Wrap a mesh for sharing with the painter.
pub fn shared<M>(mesh: M) -> SharedMesh<M> {
    Arc::new(RwLock::new(mesh))
}

/// Geometry of one mesh captured when a job starts.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    pub id: MeshId,
    pub vertex_count: usize,
    pub local_to_world: Mat4,
    /// Cached positions. Normally `vertex_count` long, but may differ if the
    /// cache is stale.
    pub positions: VertexPositions,
}

/// Discovery of meshes overlapping the brush.
///
/// Implemented by the host scene; the painter never searches space itself.
pub trait SpatialQuery<M> {
    /// Meshes whose bounds intersect the sphere at `center` with `radius`.
    fn overlap_sphere(&self, center: &Vec3, radius: f32) -> Vec<SharedMesh<M>>;
}
