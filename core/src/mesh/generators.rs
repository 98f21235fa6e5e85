//! Mesh generators for common shapes.
//!
//! These generators produce [`CpuMesh`] values with positions and triangle
//! indices and no color attribute.

use std::f32::consts::PI;

use super::data::CpuMesh;
use crate::math::Vec3;

/// Generate a UV sphere mesh.
///
/// Creates a sphere with the given radius, number of longitudinal segments,
/// and number of latitudinal rings, centered at the local origin.
///
/// # Arguments
///
/// * `radius` - Sphere radius
/// * `segments` - Number of longitudinal segments (around the equator)
/// * `rings` - Number of latitudinal rings (from pole to pole)
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> CpuMesh {
    let mut positions = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for segment in 0..=segments {
            let phi = segment as f32 * 2.0 * PI / segments as f32;

            positions.push(Vec3::new(
                sin_theta * phi.cos() * radius,
                cos_theta * radius,
                sin_theta * phi.sin() * radius,
            ));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.push(current);
            indices.push(next);
            indices.push(current + 1);

            indices.push(current + 1);
            indices.push(next);
            indices.push(next + 1);
        }
    }

    CpuMesh::new(positions)
        .with_indices(indices)
        .with_label("sphere")
}

/// Generate a quad mesh on the XY plane.
///
/// Creates a quad centered at the origin with the given half-width and
/// half-height.
///
/// # Arguments
///
/// * `half_width` - Half the width of the quad along the X axis
/// * `half_height` - Half the height of the quad along the Y axis
pub fn generate_quad(half_width: f32, half_height: f32) -> CpuMesh {
    let positions = vec![
        Vec3::new(-half_width, -half_height, 0.0),
        Vec3::new(half_width, -half_height, 0.0),
        Vec3::new(half_width, half_height, 0.0),
        Vec3::new(-half_width, half_height, 0.0),
    ];

    CpuMesh::new(positions)
        .with_indices(vec![0, 1, 2, 2, 3, 0])
        .with_label("quad")
}

/// Generate a single triangle from three local-space corners.
pub fn generate_triangle(a: Vec3, b: Vec3, c: Vec3) -> CpuMesh {
    CpuMesh::new(vec![a, b, c])
        .with_indices(vec![0, 1, 2])
        .with_label("triangle")
}
