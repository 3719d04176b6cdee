//! Wave synthesis parameters: sampling ranges and field geometry.

use log::warn;

use crate::error::WaveError;

/// Default buffer capacity (records), matches the shading stage's fixed array
pub const DEFAULT_CAPACITY: usize = 64;

/// Symmetric sampling range: values are drawn uniformly from
/// `[mean - variance, mean + variance]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub mean: f32,

    /// Half-width of the range (not a statistical variance)
    pub variance: f32,
}

impl ParamRange {
    pub const fn new(mean: f32, variance: f32) -> Self {
        Self { mean, variance }
    }

    /// Constant range (always samples `value`)
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, 0.0)
    }

    pub fn min(&self) -> f32 {
        self.mean - self.variance
    }

    pub fn max(&self) -> f32 {
        self.mean + self.variance
    }

    fn validate(&self, name: &str) -> Result<(), WaveError> {
        if !self.mean.is_finite() || !self.variance.is_finite() {
            return Err(WaveError::InvalidRangeConfig(format!(
                "{} range must be finite, got {} ± {}",
                name, self.mean, self.variance
            )));
        }
        if self.variance < 0.0 {
            return Err(WaveError::InvalidRangeConfig(format!(
                "{} variance must be >= 0, got {}",
                name, self.variance
            )));
        }
        // Sampling needs a representable width, not just finite endpoints
        if !(self.max() - self.min()).is_finite() {
            return Err(WaveError::InvalidRangeConfig(format!(
                "{} range {} ± {} overflows f32",
                name, self.mean, self.variance
            )));
        }
        Ok(())
    }
}

/// Per-wave sampling policy
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConfig {
    /// Wavelength (world units). Lower bound must stay positive.
    /// Reference: 0.2 ± 0.1
    pub wavelength: ParamRange,

    /// Vertical displacement scale (world units)
    /// Reference: 0.1 ± 0.1
    pub amplitude: ParamRange,

    /// Raw direction offset, sampled separately for X and Y
    /// Reference: 0.0 ± 0.5
    pub direction: ParamRange,

    /// Speed multiplier applied to the dispersion rate (dimensionless)
    /// Reference: 1.0 ± 1.0
    pub speed: ParamRange,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            wavelength: ParamRange::new(0.2, 0.1),
            amplitude: ParamRange::new(0.1, 0.1),
            direction: ParamRange::new(0.0, 0.5),
            speed: ParamRange::new(1.0, 1.0),
        }
    }
}

impl RangeConfig {
    /// Reject ranges that could feed a non-positive wavelength into the
    /// dispersion formula
    pub fn validate(&self) -> Result<(), WaveError> {
        self.wavelength.validate("wavelength")?;
        self.amplitude.validate("amplitude")?;
        self.direction.validate("direction")?;
        self.speed.validate("speed")?;

        if self.wavelength.min() <= 0.0 {
            return Err(WaveError::InvalidRangeConfig(format!(
                "wavelength lower bound must be > 0 (mean {} - variance {} = {})",
                self.wavelength.mean,
                self.wavelength.variance,
                self.wavelength.min()
            )));
        }

        if self.amplitude.min() < 0.0 {
            warn!(
                "Amplitude range reaches {} (< 0), waves will be phase-inverted",
                self.amplitude.min()
            );
        }

        Ok(())
    }
}

/// How a wave's horizontal direction is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionPolicy {
    /// Sample X and Y offsets independently from `RangeConfig::direction`,
    /// then normalize. Angles cluster toward the diagonals of the sampling
    /// square; kept as the default to reproduce the reference look.
    #[default]
    AxisOffsets,

    /// Sample an angle uniformly in `[0, 2π)`. Ignores the direction range.
    UniformAngle,
}

/// Everything `WaveFieldGenerator::activate` needs
#[derive(Debug, Clone, PartialEq)]
pub struct WaveFieldConfig {
    /// Active waves (must be > 0 and <= capacity)
    pub wave_count: usize,

    /// Records allocated on the GPU side
    pub capacity: usize,

    pub ranges: RangeConfig,

    pub direction_policy: DirectionPolicy,

    /// RNG seed; `None` draws fresh entropy on every activation
    pub seed: Option<u64>,
}

impl Default for WaveFieldConfig {
    fn default() -> Self {
        Self {
            wave_count: DEFAULT_CAPACITY,
            capacity: DEFAULT_CAPACITY,
            ranges: RangeConfig::default(),
            direction_policy: DirectionPolicy::default(),
            seed: None,
        }
    }
}

impl WaveFieldConfig {
    /// Validate counts and ranges before anything is allocated
    pub fn validate(&self) -> Result<(), WaveError> {
        if self.wave_count == 0 {
            return Err(WaveError::InvalidConfig(
                "wave count must be > 0".to_string(),
            ));
        }
        if self.wave_count > self.capacity {
            return Err(WaveError::CapacityExceeded {
                len: self.wave_count,
                capacity: self.capacity,
            });
        }
        self.ranges.validate()
    }
}
