//! # vcpaint
//!
//! Parallel vertex-color painting: a spherical brush blends two colors onto
//! mesh vertices, with the work split into batches on a worker pool and the
//! results merged back on the owner's tick.
//!
//! ## Core Types
//!
//! - [`BrushSettings`] / [`BrushState`] - Editable brush and its per-job snapshot
//! - [`kernel`] - Pure per-vertex color computation
//! - [`VertexPositionCache`] - Extract-once vertex positions, keyed by mesh identity
//!
//! ## Execution
//!
//! - [`partition`] / [`BatchJob`] - Disjoint vertex ranges and the work on each
//! - [`WorkerPool`] - Bounded thread pool the batches run on
//! - [`PaintJobHandle`] - Lifecycle of one paint operation on one mesh
//! - [`Painter`] - Schedules jobs for every mesh the brush touches
//! - [`reference`] - Single-threaded baseline painter
//!
//! ## Host Integration
//!
//! - [`PaintableMesh`] - Mesh access the painter needs
//! - [`SpatialQuery`] - Candidate mesh discovery, provided by the host
//! - [`SharedMesh`] - Meshes shared between the host and in-flight jobs

mod batch;
mod brush;
mod cache;
mod dispatcher;
mod error;
mod job;
pub mod kernel;
pub mod reference;
mod target;
mod worker_pool;

pub use batch::{BatchConfig, BatchJob, BatchState, BatchStatus, partition};
pub use brush::{BrushSettings, BrushState, WeightMode};
pub use cache::{VertexPositionCache, VertexPositions};
pub use dispatcher::{JobObserver, PaintMode, Painter, PainterConfig};
pub use error::PaintError;
pub use job::{CompletionCallback, JobState, PaintArgs, PaintJobHandle};
pub use target::{MeshGeometry, PaintableMesh, SharedMesh, SpatialQuery, shared};
pub use worker_pool::WorkerPool;
