//! CPU-side mesh types and generators.
//!
//! This module provides:
//!
//! - [`MeshId`] - Stable identity of a mesh asset
//! - [`CpuMesh`] - CPU-side mesh data (positions, indices, optional colors, transform)
//! - Generators for common shapes (sphere, quad)

mod data;
pub mod generators;

pub use data::{CpuMesh, MeshId};
