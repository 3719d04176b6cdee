//! Command-line argument parsing.

use clap::Parser;
use log::{info, warn};

use crate::params::{
    DirectionPolicy, FbmParams, ParamRange, RangeConfig, WaveFieldConfig, DEFAULT_CAPACITY,
};

/// Where the wave buffer lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Gpu,
    Host,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "sumsine")]
#[command(about = "Generate and upload a sum-of-sines ocean wave field", long_about = None)]
pub struct Args {
    /// Number of active waves
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_CAPACITY)]
    pub wave_count: usize,

    /// Records allocated in the wave buffer
    #[arg(long, value_name = "RECORDS", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// RNG seed (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 0.2)]
    pub mean_wavelength: f32,

    #[arg(long, default_value_t = 0.1)]
    pub wavelength_variance: f32,

    #[arg(long, default_value_t = 0.1)]
    pub mean_amplitude: f32,

    #[arg(long, default_value_t = 0.1)]
    pub amplitude_variance: f32,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub mean_direction: f32,

    #[arg(long, default_value_t = 0.5)]
    pub direction_variance: f32,

    #[arg(long, default_value_t = 1.0)]
    pub mean_speed: f32,

    #[arg(long, default_value_t = 1.0)]
    pub speed_variance: f32,

    /// Direction sampling: axis (independent X/Y offsets), angle (uniform angle)
    #[arg(long, value_name = "POLICY", default_value = "axis")]
    pub direction_policy: String,

    /// Wave buffer backend: gpu (default, falls back to host), host
    #[arg(long, value_name = "BACKEND", default_value = "gpu")]
    pub backend: String,

    /// Print every generated wave
    #[arg(long)]
    pub dump: bool,

    /// Read the GPU buffer back and compare with the uploaded image
    #[arg(long)]
    pub verify: bool,

    /// Shade with FBM instead of the wave buffer
    #[arg(long)]
    pub use_fbm: bool,

    #[arg(long, default_value_t = 1.0)]
    pub fbm_frequency: f32,

    #[arg(long, default_value_t = 1.0)]
    pub fbm_phase: f32,

    #[arg(long, default_value_t = 1.18)]
    pub fbm_lacunarity: f32,

    #[arg(long, default_value_t = 0.82)]
    pub fbm_persistence: f32,

    #[arg(long, default_value_t = 1.07)]
    pub fbm_phase_modifier: f32,

    #[arg(long, default_value_t = 8)]
    pub fbm_octaves: i32,

    #[arg(long, default_value_t = 1.0)]
    pub fbm_vert_height_multiplier: f32,

    #[arg(long, default_value_t = 0.5)]
    pub fbm_drag: f32,

    #[arg(long, default_value_t = 1.0)]
    pub fbm_wave_peak: f32,

    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub fbm_wave_peak_offset: f32,
}

impl Args {
    /// Parse direction policy from command-line arguments
    pub fn parse_direction_policy(&self) -> DirectionPolicy {
        match self.direction_policy.to_lowercase().as_str() {
            "axis" => DirectionPolicy::AxisOffsets,
            "angle" => {
                info!("Direction: uniform angle (direction range ignored)");
                DirectionPolicy::UniformAngle
            }
            other => {
                warn!("Unknown direction policy '{}', using axis", other);
                DirectionPolicy::AxisOffsets
            }
        }
    }

    /// Parse backend from command-line arguments
    pub fn parse_backend(&self) -> Backend {
        match self.backend.to_lowercase().as_str() {
            "gpu" => Backend::Gpu,
            "host" => Backend::Host,
            other => {
                warn!("Unknown backend '{}', using gpu", other);
                Backend::Gpu
            }
        }
    }

    /// Build the activation config
    pub fn wave_field_config(&self) -> WaveFieldConfig {
        WaveFieldConfig {
            wave_count: self.wave_count,
            capacity: self.capacity,
            ranges: RangeConfig {
                wavelength: ParamRange::new(self.mean_wavelength, self.wavelength_variance),
                amplitude: ParamRange::new(self.mean_amplitude, self.amplitude_variance),
                direction: ParamRange::new(self.mean_direction, self.direction_variance),
                speed: ParamRange::new(self.mean_speed, self.speed_variance),
            },
            direction_policy: self.parse_direction_policy(),
            seed: self.seed,
        }
    }

    /// Build the FBM parameter set
    pub fn fbm_params(&self) -> FbmParams {
        FbmParams {
            enabled: self.use_fbm,
            frequency: self.fbm_frequency,
            phase: self.fbm_phase,
            lacunarity: self.fbm_lacunarity,
            persistence: self.fbm_persistence,
            phase_modifier: self.fbm_phase_modifier,
            octaves: self.fbm_octaves,
            vert_height_multiplier: self.fbm_vert_height_multiplier,
            drag: self.fbm_drag,
            wave_peak: self.fbm_wave_peak,
            wave_peak_offset: self.fbm_wave_peak_offset,
        }
    }
}
