//! The per-vertex paint kernel.
//!
//! Pure functions with no shared state; batches call them concurrently.

use vcpaint_core::color::{Color, Rgb};
use vcpaint_core::math::{self, Mat4, Vec3};

use crate::brush::BrushState;

/// Blend weight for a vertex at squared distance `distance_sq` from the brush.
///
/// `0` at the inner radius, `1` at the outer radius, linear in squared
/// distance in between. Outside that band the result depends on the brush's
/// [`WeightMode`](crate::WeightMode). Equal radii divide by zero.
pub fn paint_weight(distance_sq: f32, brush: &BrushState) -> f32 {
    let weight = (distance_sq - brush.inner_radius_sq())
        / (brush.outer_radius_sq() - brush.inner_radius_sq());
    brush.weight_mode().apply(weight)
}

/// Compute the painted RGB of one vertex.
///
/// The local-space vertex is moved to world space with `local_to_world`,
/// its squared distance to the brush turned into a weight, and the inner and
/// outer colors blended with that weight.
pub fn compute_color(vertex_local: &Vec3, local_to_world: &Mat4, brush: &BrushState) -> Rgb {
    let vertex_world = math::transform_point(local_to_world, vertex_local);
    let distance_sq = math::distance_squared(&vertex_world, brush.position());
    let weight = paint_weight(distance_sq, brush);
    Color::lerp_rgb_unclamped(brush.inner_color(), brush.outer_color(), weight)
}

/// Paint one vertex over an existing color, keeping its alpha.
pub fn paint_vertex(
    existing: Color,
    vertex_local: &Vec3,
    local_to_world: &Mat4,
    brush: &BrushState,
) -> Color {
    existing.with_rgb(compute_color(vertex_local, local_to_world, brush))
}
