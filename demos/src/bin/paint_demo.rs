//! Paint Demo
//!
//! Sweeps a brush in a circle over a grid of spheres, painting every tick
//! and merging finished jobs, then reports what was painted. Headless.
//!
//! ```bash
//! cargo run --release --bin paint_demo -- --grid 6 --ticks 240
//! RUST_LOG=debug cargo run --bin paint_demo -- --mode single-threaded
//! ```

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use vcpaint::{
    BatchConfig, BrushSettings, PaintError, PaintMode, Painter, PainterConfig, WeightMode,
};
use vcpaint_core::color::Color;
use vcpaint_demos::{Scene, orbit_position};

/// Execution mode selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliMode {
    /// Paint on the main thread with the reference painter.
    SingleThreaded,
    /// Split meshes into batches on the worker pool.
    #[default]
    Parallel,
}

impl From<CliMode> for PaintMode {
    fn from(cli: CliMode) -> Self {
        match cli {
            CliMode::SingleThreaded => PaintMode::SingleThreaded,
            CliMode::Parallel => PaintMode::Parallel,
        }
    }
}

/// Vertex color painting demo.
#[derive(Parser, Debug)]
#[command(
    name = "paint_demo",
    about = "Sweep a vertex-color brush over a grid of spheres",
    version
)]
struct Args {
    /// How paint operations are executed.
    #[arg(long, default_value = "parallel", value_enum)]
    mode: CliMode,

    /// Worker thread count (defaults to the number of CPU cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Minimum number of vertices per batch.
    #[arg(long, default_value = "64")]
    min_batch_size: usize,

    /// Radius at which the inner color starts blending out.
    #[arg(long, default_value = "0.5")]
    inner_radius: f32,

    /// Radius at which the outer color is reached.
    #[arg(long, default_value = "1.5")]
    outer_radius: f32,

    /// Clamp blend weights to [0, 1] instead of extrapolating.
    #[arg(long)]
    clamp: bool,

    /// Spheres per side of the grid.
    #[arg(long, default_value = "4")]
    grid: u32,

    /// Longitudinal segments per sphere.
    #[arg(long, default_value = "64")]
    segments: u32,

    /// Latitudinal rings per sphere.
    #[arg(long, default_value = "32")]
    rings: u32,

    /// Number of ticks to run.
    #[arg(long, default_value = "120")]
    ticks: u64,

    /// Tick length in milliseconds (0 runs as fast as possible).
    #[arg(long, default_value = "16")]
    tick_ms: u64,
}

impl Args {
    fn painter_config(&self) -> PainterConfig {
        let brush = BrushSettings::default()
            .with_colors(Color::RED, Color::BLUE)
            .with_radii(self.inner_radius, self.outer_radius)
            .with_weight_mode(if self.clamp {
                WeightMode::Clamp
            } else {
                WeightMode::Extrapolate
            });

        let mut config = PainterConfig::default()
            .with_mode(self.mode.into())
            .with_brush(brush.sanitized())
            .with_batching(BatchConfig {
                min_batch_size: self.min_batch_size,
                max_workers: None,
            });
        config.num_threads = self.threads;
        config
    }
}

const SPACING: f32 = 2.5;

fn run(args: &Args) -> Result<(), PaintError> {
    let scene = Scene::sphere_grid(args.grid, args.grid, SPACING, 1.0, args.segments, args.rings);
    let stats = scene.stats();
    log::info!(
        "Scene: {} spheres, {} vertices",
        stats.meshes,
        stats.vertices
    );

    let mut painter = Painter::new(args.painter_config())?;
    log::info!(
        "Painter: {:?} mode, {} worker threads",
        painter.mode(),
        painter.pool().num_threads()
    );

    let orbit_radius = args.grid.saturating_sub(1) as f32 * SPACING * 0.5;
    let tick = Duration::from_millis(args.tick_ms);
    let started = Instant::now();
    let mut scheduled = 0;

    for frame in 0..args.ticks {
        let frame_start = Instant::now();
        painter.set_brush_position(orbit_position(frame, args.ticks, orbit_radius));
        scheduled += painter.paint(&scene)?;
        painter.update()?;

        if let Some(remaining) = tick.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
    painter.complete_all()?;

    let stats = scene.stats();
    log::info!(
        "Done in {:?}: {} paint operations, {} of {} spheres painted, {} cached meshes",
        started.elapsed(),
        scheduled,
        stats.painted_meshes,
        stats.meshes,
        painter.cache().len()
    );
    painter.cache().release_all();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Paint demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}
