//! Shading-stage seam: GPU buffer lifecycle and parameter pushes.
//!
//! The shading stage is reached through two traits. [`BufferDevice`]
//! creates, fills, binds and destroys buffers; [`ParamSink`] receives
//! named scalar parameters. [`WgpuBackend`] implements both on a real
//! device, [`HostBackend`] keeps everything in memory.

mod buffer;
mod device;
mod host;

use thiserror::Error;

pub use buffer::{BufferHandle, BufferManager};
pub use device::{ShadingUniforms, WgpuBackend};
pub use host::{HostBackend, HostBuffer};

/// Names under which buffers and parameters reach the shading stage
pub mod param_names {
    /// Wave record array
    pub const WAVES: &str = "waves";
    /// Number of meaningful records in `WAVES`
    pub const WAVE_COUNT: &str = "wave_count";

    pub const USE_FBM: &str = "USE_FBM";
    pub const FBM_FREQUENCY: &str = "fbm_frequency";
    pub const FBM_PHASE: &str = "fbm_phase";
    pub const FBM_LACUNARITY: &str = "fbm_lacunarity";
    pub const FBM_PERSISTENCE: &str = "fbm_persistence";
    pub const FBM_PHASE_MODIFIER: &str = "fbm_phase_modifier";
    pub const FBM_OCTAVES: &str = "fbm_octaves";
    pub const FBM_VERT_HEIGHT_MULTIPLIER: &str = "fbm_vert_height_multiplier";
    pub const FBM_DRAG: &str = "fbm_drag";
    pub const FBM_WAVE_PEAK: &str = "fbm_wave_peak";
    pub const FBM_WAVE_PEAK_OFFSET: &str = "fbm_wave_peak_offset";
}

/// Device-level failures
#[derive(Clone, Debug, Error)]
pub enum DeviceError {
    #[error("buffer size must be non-zero")]
    ZeroSized,
    #[error("out of GPU memory allocating {requested} bytes")]
    OutOfMemory { requested: u64 },
    #[error("buffer of {requested} bytes exceeds device limit of {limit} bytes")]
    TooLarge { requested: u64, limit: u64 },
    #[error("no compatible GPU adapter was found")]
    NoAdapter,
    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(String),
    #[error("GPU backend error: {0}")]
    Backend(String),
    #[error("failed to read back GPU buffer: {0}")]
    Readback(String),
    #[error("shading stage has no buffer slot '{0}'")]
    UnknownSlot(String),
}

/// Storage the shading stage can read
pub trait BufferDevice {
    type Buffer;

    /// Create a zero-initialized buffer of `size` bytes
    fn create_buffer(&mut self, label: &str, size: u64) -> Result<Self::Buffer, DeviceError>;

    /// Copy `data` into `buffer` at byte `offset`
    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    /// Make `buffer` visible to the shading stage under `slot`.
    /// Fails with `UnknownSlot` if the stage declares no such slot.
    fn bind_buffer(&mut self, slot: &str, buffer: &Self::Buffer) -> Result<(), DeviceError>;

    /// Drop whatever is bound under `slot`
    fn unbind_buffer(&mut self, slot: &str);

    /// Free the backing resource
    fn destroy_buffer(&mut self, buffer: Self::Buffer);
}

/// One-way push of named shading parameters
pub trait ParamSink {
    fn set_int(&mut self, name: &str, value: i32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_keyword(&mut self, name: &str, enabled: bool);
}
