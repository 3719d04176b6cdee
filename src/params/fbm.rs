//! Fractal (FBM) height modulation parameters.
//!
//! These are evaluated entirely in the shading stage. The host only
//! forwards them, unchanged, whenever frame parameters are pushed.

use crate::rendering::{param_names, ParamSink};

/// FBM shading parameters (alternative to the discrete sum of sines)
#[derive(Debug, Clone, PartialEq)]
pub struct FbmParams {
    /// Switch shading from the wave buffer to FBM evaluation
    pub enabled: bool,

    /// Base spatial frequency of the first octave
    pub frequency: f32,

    /// Base temporal phase rate of the first octave
    pub phase: f32,

    /// Frequency multiplier between octaves
    pub lacunarity: f32,

    /// Amplitude multiplier between octaves
    pub persistence: f32,

    /// Phase rate multiplier between octaves
    pub phase_modifier: f32,

    /// Number of layered octaves
    pub octaves: i32,

    /// Final height scale
    pub vert_height_multiplier: f32,

    /// Domain warp strength applied from each octave's derivative
    pub drag: f32,

    /// Peak sharpness exponent
    pub wave_peak: f32,

    /// Offset subtracted before sharpening peaks
    pub wave_peak_offset: f32,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: 1.0,
            phase: 1.0,
            lacunarity: 1.18,
            persistence: 0.82,
            phase_modifier: 1.07,
            octaves: 8,
            vert_height_multiplier: 1.0,
            drag: 0.5,
            wave_peak: 1.0,
            wave_peak_offset: 1.0,
        }
    }
}

impl FbmParams {
    /// Forward every parameter to the shading stage
    pub fn push_to<S: ParamSink + ?Sized>(&self, sink: &mut S) {
        sink.set_keyword(param_names::USE_FBM, self.enabled);
        sink.set_float(param_names::FBM_FREQUENCY, self.frequency);
        sink.set_float(param_names::FBM_PHASE, self.phase);
        sink.set_float(param_names::FBM_LACUNARITY, self.lacunarity);
        sink.set_float(param_names::FBM_PERSISTENCE, self.persistence);
        sink.set_float(param_names::FBM_PHASE_MODIFIER, self.phase_modifier);
        sink.set_int(param_names::FBM_OCTAVES, self.octaves);
        sink.set_float(
            param_names::FBM_VERT_HEIGHT_MULTIPLIER,
            self.vert_height_multiplier,
        );
        sink.set_float(param_names::FBM_DRAG, self.drag);
        sink.set_float(param_names::FBM_WAVE_PEAK, self.wave_peak);
        sink.set_float(param_names::FBM_WAVE_PEAK_OFFSET, self.wave_peak_offset);
    }
}
