//! Single-threaded reference painter.
//!
//! Paints a mesh synchronously on the calling thread, with no cache, batches
//! or worker pool. Used as the baseline the parallel path must agree with,
//! and by [`PaintMode::SingleThreaded`](crate::PaintMode::SingleThreaded).

use vcpaint_core::color::Color;

use crate::brush::BrushState;
use crate::kernel;
use crate::target::PaintableMesh;

/// Paint every vertex of `mesh` with `brush` and replace its color attribute.
///
/// A missing or mismatched color attribute starts from zero-filled colors,
/// exactly like a parallel job. Existing alpha is kept.
pub fn paint_mesh<M: PaintableMesh + ?Sized>(mesh: &mut M, brush: &BrushState) {
    let vertex_count = mesh.vertex_count();
    let mut colors = match mesh.colors() {
        Some(colors) if colors.len() == vertex_count => colors.to_vec(),
        _ => vec![Color::TRANSPARENT; vertex_count],
    };

    let local_to_world = mesh.local_to_world();
    for (slot, vertex) in colors.iter_mut().zip(mesh.vertex_positions()) {
        *slot = kernel::paint_vertex(*slot, &vertex, &local_to_world, brush);
    }

    mesh.set_colors(colors);
}
