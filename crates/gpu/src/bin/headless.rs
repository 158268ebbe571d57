//! Headless 2D SPH runner.
//!
//! Usage:
//!   sph2d-headless [SCENARIO.json] [--ticks N] [--cpu] [--png OUT.png] [--save OUT.json]
//!
//! Without a scenario a jittered dam-break block is spawned. Runs on the GPU
//! when an adapter is available, otherwise falls back to the CPU solver.
//! Set RUST_LOG=info to see per-batch metrics.

use std::path::{Path, PathBuf};

use sph2d::{DistanceField, FrameMetrics, Particle, Scenario};
use sph2d_gpu::{GpuContext, GpuDistanceField, GpuSph2D};

const METRICS_INTERVAL: usize = 60;
const DEFAULT_TICKS: usize = 600;

struct Args {
    scenario: Option<PathBuf>,
    ticks: usize,
    force_cpu: bool,
    png: Option<PathBuf>,
    save: Option<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = Args {
            scenario: None,
            ticks: DEFAULT_TICKS,
            force_cpu: false,
            png: None,
            save: None,
        };

        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--ticks" => {
                    let value = iter.next().ok_or("--ticks needs a value")?;
                    args.ticks = value
                        .parse()
                        .map_err(|e| format!("invalid --ticks '{}': {}", value, e))?;
                }
                "--cpu" => args.force_cpu = true,
                "--png" => args.png = Some(iter.next().ok_or("--png needs a path")?.into()),
                "--save" => args.save = Some(iter.next().ok_or("--save needs a path")?.into()),
                other if other.starts_with("--") => return Err(format!("unknown flag '{}'", other)),
                path => args.scenario = Some(PathBuf::from(path)),
            }
        }
        Ok(args)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse()?;
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load_json(path)?,
        None => Scenario::dam_break(24, 16, 42),
    };
    log::info!(
        "Scenario '{}': {} particles, dt={}, width={}",
        scenario.name,
        scenario.particles.len(),
        scenario.params.time_step,
        scenario.params.width
    );

    let context = if args.force_cpu {
        None
    } else {
        match GpuContext::new_headless_blocking() {
            Ok(context) => Some(context),
            Err(e) => {
                log::warn!("GPU unavailable ({}), falling back to CPU solver", e);
                None
            }
        }
    };

    let (particles, image) = match context {
        Some(context) => run_gpu(&context, &scenario, &args)?,
        None => run_cpu(&scenario, &args)?,
    };

    if let Some(path) = &args.png {
        save_png(path, &image, DistanceField::default())?;
        log::info!("Wrote distance field to {}", path.display());
    }
    if let Some(path) = &args.save {
        scenario.particles = particles;
        scenario.save_json(path)?;
        log::info!("Saved final state to {}", path.display());
    }

    Ok(())
}

fn log_metrics(backend: &str, tick: usize, metrics: &FrameMetrics) {
    log::info!("[{}] tick {:>6}: {}", backend, tick, metrics);
}

fn run_gpu(
    context: &GpuContext,
    scenario: &Scenario,
    args: &Args,
) -> Result<(Vec<Particle>, Vec<[u8; 4]>), Box<dyn std::error::Error>> {
    let device = &context.device;
    let queue = &context.queue;
    let mut sph = GpuSph2D::new(device, &scenario.config, scenario.params, &scenario.particles)?;

    let mut done = 0;
    while done < args.ticks {
        let batch = METRICS_INTERVAL.min(args.ticks - done);
        sph.run(device, queue, batch);
        done += batch;
        log_metrics("gpu", done, &sph.compute_metrics(device, queue)?);
    }

    let particles = sph.read_particles(device, queue)?;
    let image = if args.png.is_some() {
        GpuDistanceField::new(device, DistanceField::default())?.render(device, queue, &sph)?
    } else {
        Vec::new()
    };
    Ok((particles, image))
}

fn run_cpu(
    scenario: &Scenario,
    args: &Args,
) -> Result<(Vec<Particle>, Vec<[u8; 4]>), Box<dyn std::error::Error>> {
    let mut solver = scenario.build_solver()?;

    let mut done = 0;
    while done < args.ticks {
        let batch = METRICS_INTERVAL.min(args.ticks - done);
        solver.run(batch);
        done += batch;
        log_metrics("cpu", done, &solver.metrics());
    }

    let image = if args.png.is_some() {
        DistanceField::default().render(solver.particles())
    } else {
        Vec::new()
    };
    Ok((solver.particles().to_vec(), image))
}

fn save_png(path: &Path, pixels: &[[u8; 4]], field: DistanceField) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), field.width, field.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(bytemuck::cast_slice(pixels))?;
    Ok(())
}
