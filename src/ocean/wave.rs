//! Single sinusoidal wave component and its physical derivation.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Gravitational acceleration (m/s²) used by the dispersion relation
pub const GRAVITY: f32 = 9.8;

/// One wave as the shading stage reads it.
///
/// Layout: amplitude, phase, frequency, direction.x, direction.y as
/// tightly packed f32 (20 bytes, 4-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct WaveRecord {
    /// Vertical displacement scale
    pub amplitude: f32,

    /// Angular temporal rate (radians per second)
    pub phase: f32,

    /// Spatial frequency
    pub frequency: f32,

    /// Horizontal propagation direction (unit length, or zero)
    pub direction: [f32; 2],
}

impl WaveRecord {
    /// Bytes per record in the GPU buffer
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Derive a record from sampled physical inputs
    ///
    /// # Arguments
    /// * `wavelength` - Crest-to-crest distance, must be > 0
    /// * `amplitude` - Vertical scale, passed through
    /// * `direction_x`, `direction_y` - Raw direction, normalized here
    /// * `speed` - Multiplier on the deep-water dispersion rate
    pub fn from_physical(
        wavelength: f32,
        amplitude: f32,
        direction_x: f32,
        direction_y: f32,
        speed: f32,
    ) -> Self {
        debug_assert!(wavelength > 0.0, "wavelength must be positive");

        // Deep water: ω = sqrt(g·k), k = 2π/L
        let phase = speed * (GRAVITY * 2.0 * PI / wavelength).sqrt();
        let frequency = 2.0 / wavelength;

        // Zero offsets stay zero instead of dividing by zero
        let direction = Vec2::new(direction_x, direction_y).normalize_or_zero();

        Self {
            amplitude,
            phase,
            frequency,
            direction: direction.to_array(),
        }
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::from_array(self.direction)
    }
}
