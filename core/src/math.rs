//! Math type aliases and helper functions.
//!
//! All painting math is f32, backed by `nalgebra`.

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// 3D point (f32).
pub type Point3 = nalgebra::Point3<f32>;

/// Transform a position by a 4x4 matrix, including translation and the
/// projective divide.
pub fn transform_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
    matrix.transform_point(&Point3::from(*point)).coords
}

/// Squared Euclidean distance between two positions.
pub fn distance_squared(a: &Vec3, b: &Vec3) -> f32 {
    (a - b).norm_squared()
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Build a 4x4 matrix applying a uniform scale, then a translation.
pub fn mat4_from_scale_translation(scale: f32, translation: Vec3) -> Mat4 {
    #[rustfmt::skip]
    let result = Mat4::new(
        scale, 0.0,   0.0,   translation.x,
        0.0,   scale, 0.0,   translation.y,
        0.0,   0.0,   scale, translation.z,
        0.0,   0.0,   0.0,   1.0,
    );
    result
}
