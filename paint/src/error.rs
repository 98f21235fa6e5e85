//! Paint error types.

use thiserror::Error;
use vcpaint_core::mesh::MeshId;

use crate::job::JobState;

/// Errors reported by the painting engine.
///
/// All variants describe caller-side precondition violations or a lost
/// worker; painting itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaintError {
    /// Radii must satisfy `0 <= inner < outer` and be finite before scheduling.
    #[error("invalid brush radii: inner {inner}, outer {outer} (expected 0 <= inner < outer)")]
    InvalidRadii { inner: f32, outer: f32 },

    /// A job handle is one-shot and was started a second time.
    #[error("paint job already started (state: {state:?})")]
    AlreadyStarted { state: JobState },

    /// The worker running a job's batches stopped without returning the color buffer.
    #[error("paint worker for {mesh} stopped without returning its color buffer")]
    WorkerLost { mesh: MeshId },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}
