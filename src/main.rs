//! tidemill - headless FFT ocean driver
//!
//! Runs the wave synthesizer for a fixed number of ticks, then reports
//! surface statistics, answers height queries and optionally writes a
//! heightmap snapshot.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use tidemill::cli::Args;
use tidemill::ocean::{save_heightmap, OceanSystem, Topology};
use tidemill::params::OceanConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match OceanConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => OceanConfig::default(),
    };
    args.apply_overrides(&mut config);

    let params = &config.ocean;
    info!(
        "Ocean: {}x{} grid, {}x{} m tile, wind ({}, {}), {:?} backend",
        params.grid_size,
        params.grid_size,
        params.vertex_distance.x,
        params.vertex_distance.y,
        params.wind_factor.x,
        params.wind_factor.y,
        params.backend
    );

    let mut ocean = OceanSystem::from_config(&config);
    let start = Instant::now();
    for _ in 0..args.ticks {
        ocean.update(args.dt);
    }
    let elapsed = start.elapsed();

    let (min, max) = ocean
        .vertices()
        .iter()
        .map(|v| v.position[1])
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    info!(
        "{} ticks in {:.1}ms ({:.3}ms/tick), t = {:.3}s",
        args.ticks,
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / args.ticks.max(1) as f64,
        ocean.time_s()
    );
    info!(
        "{} vertices, {} triangle indices, {} instances, height range [{:.4}, {:.4}]",
        ocean.vertices().len(),
        ocean.indices(Topology::Triangles).len(),
        ocean.instances().len(),
        min,
        max
    );

    for sample in args.parse_samples() {
        let point = ocean.get_height(sample.x, sample.y);
        info!(
            "Height at ({}, {}): {:.5} (surface point {:.3}, {:.3})",
            sample.x, sample.y, point.y, point.x, point.z
        );
    }

    if let Some(path) = &args.snapshot {
        let Some(field) = ocean.field() else {
            error!("No wave field to snapshot, run at least one tick");
            return ExitCode::FAILURE;
        };
        if let Err(e) = save_heightmap(field, path) {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
