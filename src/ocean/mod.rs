//! Sum-of-sines ocean wave field: record layout, sampling, lifecycle.

mod generator;
mod sampling;
mod wave;

// Re-export public types
pub use generator::WaveFieldGenerator;
pub use wave::{WaveRecord, GRAVITY};
