//! Sumsine - sum-of-sines ocean wave field generator
//!
//! Samples a wave field, uploads it to the shading stage's wave buffer,
//! forwards the frame parameters, and releases everything on exit.

use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn};

use sumsine::cli::{Args, Backend};
use sumsine::ocean::{WaveFieldGenerator, WaveRecord};
use sumsine::params::{FbmParams, WaveFieldConfig};
use sumsine::rendering::{BufferDevice, HostBackend, ParamSink, WgpuBackend};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.wave_field_config();
    let fbm = args.fbm_params();

    match args.parse_backend() {
        Backend::Gpu => match pollster::block_on(WgpuBackend::new()) {
            Ok(backend) => run_gpu(backend, &config, fbm, &args),
            Err(e) => {
                warn!("GPU unavailable ({}), falling back to host buffers", e);
                run(WaveFieldGenerator::new(HostBackend::new()), &config, fbm, &args)
            }
        },
        Backend::Host => run(WaveFieldGenerator::new(HostBackend::new()), &config, fbm, &args),
    }
}

fn run_gpu(
    backend: WgpuBackend,
    config: &WaveFieldConfig,
    fbm: FbmParams,
    args: &Args,
) -> anyhow::Result<()> {
    let mut generator = WaveFieldGenerator::new(backend);
    generator.set_fbm(fbm);
    let handle = generator
        .activate(config)
        .context("Wave field activation failed")?;
    generator.push_frame_params();
    report(generator.waves(), args.dump);

    if args.verify {
        let buffers = generator.buffers();
        let gpu_bytes = pollster::block_on(buffers.device().read_buffer(buffers.buffer(handle)?))?;
        let image = generator.upload_image();
        let expected: &[u8] = bytemuck::cast_slice(&image);

        if gpu_bytes.as_slice() != expected {
            generator.deactivate();
            bail!("GPU wave buffer does not match uploaded field");
        }
        println!("Verified {} bytes of GPU wave buffer", gpu_bytes.len());
    }

    generator.deactivate();
    Ok(())
}

fn run<D: BufferDevice + ParamSink>(
    mut generator: WaveFieldGenerator<D>,
    config: &WaveFieldConfig,
    fbm: FbmParams,
    args: &Args,
) -> anyhow::Result<()> {
    if args.verify {
        info!("--verify only applies to the gpu backend");
    }

    generator.set_fbm(fbm);
    generator
        .activate(config)
        .context("Wave field activation failed")?;
    generator.push_frame_params();
    report(generator.waves(), args.dump);

    generator.deactivate();
    Ok(())
}

/// Print a summary (and optionally every wave)
fn report(waves: &[WaveRecord], dump: bool) {
    if waves.is_empty() {
        return;
    }

    let count = waves.len() as f32;
    let mean_amplitude = waves.iter().map(|w| w.amplitude).sum::<f32>() / count;
    let mean_wavelength = waves.iter().map(|w| 2.0 / w.frequency).sum::<f32>() / count;
    let max_phase = waves.iter().map(|w| w.phase).fold(f32::MIN, f32::max);

    println!("Generated {} waves", waves.len());
    println!("  Mean amplitude:  {:.4}", mean_amplitude);
    println!("  Mean wavelength: {:.4}", mean_wavelength);
    println!("  Max phase rate:  {:.4} rad/s", max_phase);

    if dump {
        println!(
            "\n{:>4} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "#", "amplitude", "phase", "frequency", "dir.x", "dir.y"
        );
        for (i, w) in waves.iter().enumerate() {
            println!(
                "{:>4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                i, w.amplitude, w.phase, w.frequency, w.direction[0], w.direction[1]
            );
        }
    }
}
