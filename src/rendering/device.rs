//! wgpu shading-stage backend with storage-buffer wave binding.

use bytemuck::{Pod, Zeroable};
use log::{debug, warn};

use super::{param_names, BufferDevice, DeviceError, ParamSink};

/// Uniform block read next to the wave buffer (binding 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ShadingUniforms {
    pub wave_count: u32,
    pub use_fbm: u32,
    pub fbm_octaves: u32,
    pub fbm_frequency: f32,
    pub fbm_phase: f32,
    pub fbm_lacunarity: f32,
    pub fbm_persistence: f32,
    pub fbm_phase_modifier: f32,
    pub fbm_vert_height_multiplier: f32,
    pub fbm_drag: f32,
    pub fbm_wave_peak: f32,
    pub fbm_wave_peak_offset: f32,
}

/// Headless wgpu device exposing one bind group to the render pass:
/// binding 0 = wave records (read-only storage), binding 1 = `ShadingUniforms`
pub struct WgpuBackend {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    uniform_buffer: wgpu::Buffer,
    uniforms: ShadingUniforms,
}

impl WgpuBackend {
    /// Request an adapter and device (no surface needed)
    pub async fn new() -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DeviceError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Wave Field Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| DeviceError::RequestDevice(e.to_string()))?;

        debug!("Using GPU adapter: {}", adapter.get_info().name);

        Ok(Self::from_device(device, queue))
    }

    /// Wrap a device owned by the host renderer
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Wave Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT
                        | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT
                        | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let uniforms = ShadingUniforms::default();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shading Uniform Buffer"),
            size: std::mem::size_of::<ShadingUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device,
            queue,
            bind_group_layout,
            bind_group: None,
            uniform_buffer,
            uniforms,
        }
    }

    /// Layout the external render pipeline must include
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Bind group for the currently bound wave buffer
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Current host-side copy of the uniform block
    pub fn uniforms(&self) -> &ShadingUniforms {
        &self.uniforms
    }

    /// Copy `source` back to host memory
    pub async fn read_buffer(&self, source: &wgpu::Buffer) -> Result<Vec<u8>, DeviceError> {
        let size = source.size();
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Wave Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Wave Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging_buffer, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .await
            .map_err(|e| DeviceError::Readback(e.to_string()))?
            .map_err(|e| DeviceError::Readback(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let bytes = data.to_vec();

        drop(data);
        staging_buffer.unmap();

        Ok(bytes)
    }

    fn write_uniforms(&self) {
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.uniforms]),
        );
    }
}

impl BufferDevice for WgpuBackend {
    type Buffer = wgpu::Buffer;

    fn create_buffer(&mut self, label: &str, size: u64) -> Result<wgpu::Buffer, DeviceError> {
        if size == 0 {
            return Err(DeviceError::ZeroSized);
        }

        let limits = self.device.limits();
        let limit = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        if size > limit {
            return Err(DeviceError::TooLarge {
                requested: size,
                limit,
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match out_of_memory.or(validation) {
            None => Ok(buffer),
            Some(err) => {
                buffer.destroy();
                match err {
                    wgpu::Error::OutOfMemory { .. } => {
                        Err(DeviceError::OutOfMemory { requested: size })
                    }
                    other => Err(DeviceError::Backend(other.to_string())),
                }
            }
        }
    }

    fn write_buffer(&mut self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn bind_buffer(&mut self, slot: &str, buffer: &wgpu::Buffer) -> Result<(), DeviceError> {
        if slot != param_names::WAVES {
            return Err(DeviceError::UnknownSlot(slot.to_string()));
        }

        self.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Wave Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        }));
        Ok(())
    }

    fn unbind_buffer(&mut self, slot: &str) {
        if slot == param_names::WAVES {
            self.bind_group = None;
        }
    }

    fn destroy_buffer(&mut self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }
}

impl ParamSink for WgpuBackend {
    fn set_int(&mut self, name: &str, value: i32) {
        let value = value.max(0) as u32;
        match name {
            param_names::WAVE_COUNT => self.uniforms.wave_count = value,
            param_names::FBM_OCTAVES => self.uniforms.fbm_octaves = value,
            _ => {
                warn!("Unknown int shading parameter '{}'", name);
                return;
            }
        }
        self.write_uniforms();
    }

    fn set_float(&mut self, name: &str, value: f32) {
        let field = match name {
            param_names::FBM_FREQUENCY => &mut self.uniforms.fbm_frequency,
            param_names::FBM_PHASE => &mut self.uniforms.fbm_phase,
            param_names::FBM_LACUNARITY => &mut self.uniforms.fbm_lacunarity,
            param_names::FBM_PERSISTENCE => &mut self.uniforms.fbm_persistence,
            param_names::FBM_PHASE_MODIFIER => &mut self.uniforms.fbm_phase_modifier,
            param_names::FBM_VERT_HEIGHT_MULTIPLIER => {
                &mut self.uniforms.fbm_vert_height_multiplier
            }
            param_names::FBM_DRAG => &mut self.uniforms.fbm_drag,
            param_names::FBM_WAVE_PEAK => &mut self.uniforms.fbm_wave_peak,
            param_names::FBM_WAVE_PEAK_OFFSET => &mut self.uniforms.fbm_wave_peak_offset,
            _ => {
                warn!("Unknown float shading parameter '{}'", name);
                return;
            }
        };
        *field = value;
        self.write_uniforms();
    }

    fn set_keyword(&mut self, name: &str, enabled: bool) {
        match name {
            param_names::USE_FBM => self.uniforms.use_fbm = enabled as u32,
            _ => {
                warn!("Unknown shading keyword '{}'", name);
                return;
            }
        }
        self.write_uniforms();
    }
}
