//! Wave field lifecycle: regenerate on activate, release on deactivate.

use log::{debug, info};

use super::sampling::WaveSampler;
use super::wave::WaveRecord;
use crate::error::WaveError;
use crate::params::{FbmParams, WaveFieldConfig};
use crate::rendering::{param_names, BufferDevice, BufferHandle, BufferManager, ParamSink};

/// Owns the wave field and drives its GPU buffer
pub struct WaveFieldGenerator<D: BufferDevice + ParamSink> {
    buffers: BufferManager<D>,
    waves: Vec<WaveRecord>,
    fbm: FbmParams,
}

impl<D: BufferDevice + ParamSink> WaveFieldGenerator<D> {
    pub fn new(device: D) -> Self {
        Self {
            buffers: BufferManager::new(device),
            waves: Vec::new(),
            fbm: FbmParams::default(),
        }
    }

    /// Sample a fresh wave field and make it resident on the shading stage
    ///
    /// Releases any previous field first. On failure nothing stays
    /// allocated or bound.
    pub fn activate(&mut self, config: &WaveFieldConfig) -> Result<BufferHandle, WaveError> {
        if self.is_active() {
            debug!("Re-activating wave field, releasing previous buffer");
            self.deactivate();
        }

        config.validate()?;

        let handle = self
            .buffers
            .ensure_allocated(config.capacity, WaveRecord::STRIDE)?;

        let waves = WaveSampler::new(config).generate(config.wave_count);
        let image = pad_to_capacity(&waves, self.buffers.capacity());

        let uploaded = self.buffers.upload(handle, &image);
        if let Err(err) = uploaded.and_then(|()| self.buffers.rebind(handle, param_names::WAVES)) {
            self.buffers.release();
            return Err(err);
        }

        self.buffers
            .device_mut()
            .set_int(param_names::WAVE_COUNT, config.wave_count as i32);

        info!(
            "Wave field active: {} waves in buffer {} (capacity {})",
            waves.len(),
            handle,
            self.buffers.capacity()
        );
        self.waves = waves;

        Ok(handle)
    }

    /// Release the buffer and drop the field. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        if self.buffers.release() {
            self.buffers.device_mut().set_int(param_names::WAVE_COUNT, 0);
            info!("Wave field released");
        }
        self.waves.clear();
    }

    /// Forward per-frame shading parameters (independent of wave data)
    pub fn push_frame_params(&mut self) {
        self.fbm.push_to(self.buffers.device_mut());
    }

    pub fn is_active(&self) -> bool {
        self.buffers.handle().is_some()
    }

    /// Active waves (empty when inactive)
    pub fn waves(&self) -> &[WaveRecord] {
        &self.waves
    }

    /// Byte-for-byte copy of what was uploaded: waves, then zeroed records
    pub fn upload_image(&self) -> Vec<WaveRecord> {
        pad_to_capacity(&self.waves, self.buffers.capacity())
    }

    pub fn fbm(&self) -> &FbmParams {
        &self.fbm
    }

    pub fn set_fbm(&mut self, fbm: FbmParams) {
        self.fbm = fbm;
    }

    pub fn buffers(&self) -> &BufferManager<D> {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut BufferManager<D> {
        &mut self.buffers
    }
}

fn pad_to_capacity(waves: &[WaveRecord], capacity: usize) -> Vec<WaveRecord> {
    let mut image = waves.to_vec();
    if image.len() < capacity {
        image.resize(capacity, WaveRecord::default());
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DirectionPolicy, ParamRange, RangeConfig};
    use crate::rendering::{DeviceError, HostBackend};

    fn config(wave_count: usize, capacity: usize, seed: u64) -> WaveFieldConfig {
        WaveFieldConfig {
            wave_count,
            capacity,
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn generator() -> WaveFieldGenerator<HostBackend> {
        WaveFieldGenerator::new(HostBackend::new())
    }

    #[test]
    fn test_activate_produces_wave_count_records() {
        let mut gen = generator();
        gen.activate(&config(48, 64, 1)).unwrap();

        assert!(gen.is_active());
        assert_eq!(gen.waves().len(), 48);
        for wave in gen.waves() {
            assert!((wave.direction().length() - 1.0).abs() < 1e-5);
            assert!(wave.frequency > 0.0);
            assert!(wave.phase.is_finite());
        }
    }

    #[test]
    fn test_upload_is_padded_to_capacity() {
        let mut gen = generator();
        gen.activate(&config(3, 64, 2)).unwrap();

        let bytes = gen
            .buffers()
            .device()
            .bound_bytes(param_names::WAVES)
            .unwrap();
        assert_eq!(bytes.len(), 64 * WaveRecord::STRIDE);

        let active = 3 * WaveRecord::STRIDE;
        let waves: &[u8] = bytemuck::cast_slice(gen.waves());
        assert_eq!(&bytes[..active], waves);
        assert!(bytes[active..].iter().all(|b| *b == 0));

        let image = gen.upload_image();
        assert_eq!(bytes, bytemuck::cast_slice::<WaveRecord, u8>(image.as_slice()));
    }

    #[test]
    fn test_wave_count_pushed_to_shading_stage() {
        let mut gen = generator();
        gen.activate(&config(12, 64, 3)).unwrap();

        assert_eq!(gen.buffers().device().int(param_names::WAVE_COUNT), Some(12));
    }

    #[test]
    fn test_constant_ranges_scenario() {
        let mut gen = generator();
        let config = WaveFieldConfig {
            wave_count: 3,
            capacity: 64,
            ranges: RangeConfig {
                wavelength: ParamRange::fixed(0.2),
                amplitude: ParamRange::fixed(0.1),
                direction: ParamRange::fixed(0.0),
                speed: ParamRange::fixed(1.0),
            },
            direction_policy: DirectionPolicy::AxisOffsets,
            seed: None,
        };
        gen.activate(&config).unwrap();

        assert_eq!(gen.waves().len(), 3);
        for wave in gen.waves() {
            assert!((wave.frequency - 10.0).abs() < 1e-4);
            assert!((wave.phase - 17.5464).abs() < 1e-3);
            assert_eq!(wave.amplitude, 0.1);
            assert_eq!(wave.direction, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_double_deactivate_is_noop() {
        let mut gen = generator();
        gen.deactivate();

        gen.activate(&config(8, 8, 4)).unwrap();
        gen.deactivate();
        gen.deactivate();

        assert!(!gen.is_active());
        assert!(gen.waves().is_empty());
        assert_eq!(gen.buffers().device().live_buffers(), 0);
    }

    #[test]
    fn test_deactivate_clears_wave_count() {
        let mut gen = generator();
        gen.activate(&config(8, 8, 4)).unwrap();
        gen.deactivate();

        assert_eq!(gen.buffers().device().int(param_names::WAVE_COUNT), Some(0));
    }

    #[test]
    fn test_overflowing_range_fails_before_allocation() {
        let mut gen = generator();
        let mut bad = config(8, 64, 11);
        bad.ranges.speed = ParamRange::new(0.0, 3.0e38);

        assert!(matches!(
            gen.activate(&bad),
            Err(WaveError::InvalidRangeConfig(_))
        ));
        assert!(!gen.is_active());
        assert_eq!(gen.buffers().device().live_buffers(), 0);
    }

    #[test]
    fn test_huge_capacity_fails_with_allocation_error() {
        let mut gen = generator();

        let result = gen.activate(&config(1, 1 << 56, 12));
        assert!(matches!(
            result,
            Err(WaveError::Allocation(DeviceError::OutOfMemory { .. }))
        ));
        assert!(!gen.is_active());
        assert!(gen.buffers().device().bound_bytes(param_names::WAVES).is_none());
    }

    #[test]
    fn test_reactivate_with_new_seed() {
        let mut gen = generator();
        gen.activate(&config(16, 64, 5)).unwrap();
        let first = gen.waves().to_vec();
        gen.deactivate();

        gen.activate(&config(16, 64, 6)).unwrap();
        let second = gen.waves().to_vec();

        assert_eq!(second.len(), 16);
        assert_ne!(first, second);
        for wave in &second {
            assert!((wave.direction().length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_reactivate_releases_previous_buffer() {
        let mut gen = generator();
        let first = gen.activate(&config(8, 64, 7)).unwrap();
        let second = gen.activate(&config(8, 32, 8)).unwrap();

        assert_ne!(first, second);
        assert_eq!(gen.buffers().device().live_buffers(), 1);
        assert_eq!(gen.buffers().capacity(), 32);
    }

    #[test]
    fn test_invalid_config_rejected_before_allocation() {
        let mut gen = generator();
        let mut bad = config(8, 64, 9);
        bad.ranges.wavelength = ParamRange::new(0.2, 0.5);

        assert!(matches!(
            gen.activate(&bad),
            Err(WaveError::InvalidRangeConfig(_))
        ));
        assert!(matches!(
            gen.activate(&config(65, 64, 9)),
            Err(WaveError::CapacityExceeded { len: 65, capacity: 64 })
        ));
        assert_eq!(gen.buffers().device().live_buffers(), 0);
        assert!(!gen.is_active());
    }

    #[test]
    fn test_failed_allocation_leaves_nothing_bound() {
        let mut gen = WaveFieldGenerator::new(HostBackend::with_memory_limit(64));

        let result = gen.activate(&config(8, 64, 10));
        assert!(matches!(
            result,
            Err(WaveError::Allocation(DeviceError::OutOfMemory { .. }))
        ));
        assert!(!gen.is_active());
        assert!(gen.buffers().device().bound_bytes(param_names::WAVES).is_none());
        assert_eq!(gen.buffers().device().int(param_names::WAVE_COUNT), None);
    }

    #[test]
    fn test_frame_params_forward_fbm() {
        let mut gen = generator();
        gen.set_fbm(FbmParams {
            enabled: true,
            octaves: 3,
            ..Default::default()
        });
        gen.push_frame_params();

        let host = gen.buffers().device();
        assert_eq!(host.keyword(param_names::USE_FBM), Some(true));
        assert_eq!(host.int(param_names::FBM_OCTAVES), Some(3));
        // Frame pushes never touch wave data
        assert_eq!(host.live_buffers(), 0);
    }
}
