//! Parameter definitions with documented units and semantics.
//!
//! All tunable numbers live here with:
//! - Reference defaults
//! - Documented ranges and meanings
//! - Validation before anything touches the GPU

mod fbm;
mod waves;

// Re-export all types
pub use fbm::FbmParams;
pub use waves::{DirectionPolicy, ParamRange, RangeConfig, WaveFieldConfig, DEFAULT_CAPACITY};
