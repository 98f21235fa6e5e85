//! # vcpaint demos
//!
//! A minimal host for the painter: a flat list of meshes with a brute-force
//! spatial query, and a brush path to sweep across it.
//!
//! ## Available Demos
//!
//! - `paint_demo` - Sweeps a brush over a grid of spheres, headless

use std::f32::consts::TAU;

use vcpaint::{SharedMesh, SpatialQuery, shared};
use vcpaint_core::math::{self, Vec3};
use vcpaint_core::mesh::CpuMesh;
use vcpaint_core::mesh::generators::generate_sphere;

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A flat collection of shared meshes.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: Vec<SharedMesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `columns` x `rows` grid of spheres on the XZ plane, centered on the
    /// origin, `spacing` apart.
    pub fn sphere_grid(
        columns: u32,
        rows: u32,
        spacing: f32,
        radius: f32,
        segments: u32,
        rings: u32,
    ) -> Self {
        let mut scene = Self::new();
        let offset_x = (columns.saturating_sub(1)) as f32 * spacing * 0.5;
        let offset_z = (rows.saturating_sub(1)) as f32 * spacing * 0.5;

        for row in 0..rows {
            for column in 0..columns {
                let translation = Vec3::new(
                    column as f32 * spacing - offset_x,
                    0.0,
                    row as f32 * spacing - offset_z,
                );
                scene.add(
                    generate_sphere(radius, segments, rings)
                        .with_transform(math::mat4_from_translation(translation))
                        .with_label(format!("sphere_{column}_{row}")),
                );
            }
        }
        scene
    }

    /// Add a mesh and return its shared handle.
    pub fn add(&mut self, mesh: CpuMesh) -> SharedMesh {
        let mesh = shared(mesh);
        self.meshes.push(mesh.clone());
        mesh
    }

    pub fn meshes(&self) -> &[SharedMesh] {
        &self.meshes
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Totals over every mesh in the scene.
    pub fn stats(&self) -> SceneStats {
        let mut stats = SceneStats::default();
        for mesh in &self.meshes {
            let mesh = mesh.read();
            stats.meshes += 1;
            stats.vertices += mesh.vertex_count();
            if mesh.colors().is_some() {
                stats.painted_meshes += 1;
            }
        }
        stats
    }
}

impl SpatialQuery<CpuMesh> for Scene {
    /// Tests every mesh's world bounding sphere against the query sphere.
    fn overlap_sphere(&self, center: &Vec3, radius: f32) -> Vec<SharedMesh> {
        self.meshes
            .iter()
            .filter(|mesh| {
                let (bounds_center, bounds_radius) = mesh.read().world_bounding_sphere();
                let reach = bounds_radius + radius;
                math::distance_squared(&bounds_center, center) <= reach * reach
            })
            .cloned()
            .collect()
    }
}

/// Summary of a [`Scene`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub meshes: usize,
    pub vertices: usize,
    /// Meshes that have a color attribute.
    pub painted_meshes: usize,
}

/// Position on a horizontal circle of `radius` around the origin after
/// `tick` of `ticks_per_loop` steps.
pub fn orbit_position(tick: u64, ticks_per_loop: u64, radius: f32) -> Vec3 {
    let angle = (tick % ticks_per_loop.max(1)) as f32 / ticks_per_loop.max(1) as f32 * TAU;
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}
