//! Error types for wave field activation and buffer management.

use thiserror::Error;

use crate::rendering::{BufferHandle, DeviceError};

/// Failures surfaced by [`crate::rendering::BufferManager`] and
/// [`crate::ocean::WaveFieldGenerator`].
#[derive(Debug, Error)]
pub enum WaveError {
    #[error("wave buffer allocation failed: {0}")]
    Allocation(#[from] DeviceError),

    #[error("{len} wave records exceed buffer capacity of {capacity}")]
    CapacityExceeded { len: usize, capacity: usize },

    #[error("invalid range config: {0}")]
    InvalidRangeConfig(String),

    #[error("invalid wave field config: {0}")]
    InvalidConfig(String),

    #[error("failed to bind wave buffer: {0}")]
    Bind(DeviceError),

    #[error("wave buffer {0} used after release")]
    UseAfterFree(BufferHandle),

    #[error("record stride mismatch (buffer stride={expected}, records={actual})")]
    StrideMismatch { expected: usize, actual: usize },
}
