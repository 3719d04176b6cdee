//! Stochastic wave parameter sampling.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::wave::WaveRecord;
use crate::params::{DirectionPolicy, ParamRange, RangeConfig, WaveFieldConfig};

/// Draws independent waves from a validated `RangeConfig`
pub(crate) struct WaveSampler {
    rng: StdRng,
    ranges: RangeConfig,
    direction_policy: DirectionPolicy,
}

impl WaveSampler {
    /// Create a sampler for `config`; seeded if `config.seed` is set
    pub fn new(config: &WaveFieldConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            ranges: config.ranges.clone(),
            direction_policy: config.direction_policy,
        }
    }

    /// Sample one wave (draw order: wavelength, amplitude, direction, speed)
    pub fn sample_wave(&mut self) -> WaveRecord {
        let wavelength = sample(&mut self.rng, &self.ranges.wavelength);
        let amplitude = sample(&mut self.rng, &self.ranges.amplitude);

        let (direction_x, direction_y) = match self.direction_policy {
            DirectionPolicy::AxisOffsets => (
                sample(&mut self.rng, &self.ranges.direction),
                sample(&mut self.rng, &self.ranges.direction),
            ),
            DirectionPolicy::UniformAngle => {
                let angle = self.rng.gen_range(0.0..TAU);
                (angle.cos(), angle.sin())
            }
        };

        let speed = sample(&mut self.rng, &self.ranges.speed);

        WaveRecord::from_physical(wavelength, amplitude, direction_x, direction_y, speed)
    }

    /// Sample `count` independent waves
    pub fn generate(&mut self, count: usize) -> Vec<WaveRecord> {
        (0..count).map(|_| self.sample_wave()).collect()
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, range: &ParamRange) -> f32 {
    rng.gen_range(range.min()..=range.max())
}
