//! CPU-side mesh data structures.
//!
//! This module provides:
//! - [`MeshId`] - Process-unique identity of a mesh asset
//! - [`CpuMesh`] - CPU-side mesh holding positions, indices and an optional color attribute

use std::sync::atomic::{AtomicU64, Ordering};

use crate::color::Color;
use crate::math::{self, Mat4, Vec3};

/// Stable identity distinguishing one mesh asset from another.
///
/// Identities are allocated from a process-wide counter and never reused.
/// Cloning a [`CpuMesh`] keeps its identity: the clone refers to the same
/// asset geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    /// Allocate a new, never before used identity.
    pub fn new_unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MeshId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// A CPU-side mesh placed in the world.
///
/// Holds vertex positions in local space, triangle indices, an optional
/// per-vertex color attribute and the local-to-world transform of the
/// object carrying it.
///
/// The color attribute may be absent or have a length different from the
/// vertex count (for example after positions were replaced). Consumers that
/// need a full attribute are expected to reallocate it.
#[derive(Clone)]
pub struct CpuMesh {
    id: MeshId,
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    colors: Option<Vec<Color>>,
    transform: Mat4,
    label: Option<String>,
}

impl CpuMesh {
    /// Create a mesh from local-space positions, with a fresh identity and an
    /// identity transform.
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            id: MeshId::new_unique(),
            positions,
            indices: Vec::new(),
            colors: None,
            transform: Mat4::identity(),
            label: None,
        }
    }

    /// Set triangle indices.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    /// Set the color attribute.
    pub fn with_colors(mut self, colors: Vec<Color>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Set the local-to-world transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the mesh identity.
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get local-space vertex positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Replace the vertex positions.
    ///
    /// The identity is kept, so caches keyed by [`MeshId`] now hold stale
    /// geometry for this mesh until they are invalidated.
    pub fn set_positions(&mut self, positions: Vec<Vec3>) {
        self.positions = positions;
    }

    /// Get the triangle indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Get the color attribute, if any.
    pub fn colors(&self) -> Option<&[Color]> {
        self.colors.as_deref()
    }

    /// Replace the color attribute wholesale.
    pub fn set_colors(&mut self, colors: Vec<Color>) {
        self.colors = Some(colors);
    }

    /// Remove the color attribute.
    pub fn clear_colors(&mut self) {
        self.colors = None;
    }

    /// Get the local-to-world transform.
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Move the mesh in the world.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Get the debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// World-space bounding sphere as `(center, radius)`.
    ///
    /// The center is the transformed centroid of the positions; the radius
    /// reaches the farthest transformed vertex. An empty mesh has a zero
    /// radius around its origin.
    pub fn world_bounding_sphere(&self) -> (Vec3, f32) {
        if self.positions.is_empty() {
            return (math::transform_point(&self.transform, &Vec3::zeros()), 0.0);
        }

        let world: Vec<Vec3> = self
            .positions
            .iter()
            .map(|p| math::transform_point(&self.transform, p))
            .collect();
        let center = world.iter().fold(Vec3::zeros(), |acc, p| acc + p) / world.len() as f32;
        let radius_sq = world
            .iter()
            .map(|p| math::distance_squared(p, &center))
            .fold(0.0f32, f32::max);
        (center, radius_sq.sqrt())
    }
}

impl std::fmt::Debug for CpuMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuMesh")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("vertex_count", &self.positions.len())
            .field("index_count", &self.indices.len())
            .field("color_count", &self.colors.as_ref().map(Vec::len))
            .finish()
    }
}
