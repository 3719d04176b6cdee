//! Sumsine library - Procedural sum-of-sines ocean wave field

pub mod cli;
pub mod error;
pub mod ocean;
pub mod params;
pub mod rendering;

pub use error::WaveError;
