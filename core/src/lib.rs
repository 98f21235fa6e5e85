//! # vcpaint core
//!
//! Engine-agnostic building blocks shared by the painter and its hosts:
//!
//! - [`math`] - `nalgebra` type aliases and transform helpers
//! - [`color`] - linear RGBA [`Color`](color::Color)
//! - [`mesh`] - CPU-side meshes with stable identities and generators

pub mod color;
pub mod math;
pub mod mesh;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
