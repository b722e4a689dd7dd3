//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use crate::params::{OceanConfig, Parallelism, SynthesisBackend};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "tidemill")]
#[command(about = "Headless FFT ocean wave synthesis", long_about = None)]
pub struct Args {
    /// TOML configuration file (an `[ocean]` table, `base_height`, `[[influence]]` maps)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cells per side of the simulated tile (power of two, 2..=1024)
    #[arg(long, value_name = "N")]
    pub grid_size: Option<usize>,

    /// Wind direction times speed (m/s)
    #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true)]
    pub wind: Option<Vec<f32>>,

    /// Phillips spectrum amplitude
    #[arg(long, value_name = "A")]
    pub wave_height: Option<f32>,

    /// Gravitational acceleration (m/s²)
    #[arg(long, value_name = "G")]
    pub gravity: Option<f32>,

    /// World extent of one tile along x and z (meters)
    #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true)]
    pub vertex_distance: Option<Vec<f32>>,

    /// Tiles per side of the instanced grid
    #[arg(long, value_name = "COUNT", allow_negative_numbers = true)]
    pub instances: Option<i32>,

    /// Number of simulation ticks to run
    #[arg(long, value_name = "TICKS", default_value = "60")]
    pub ticks: u32,

    /// Wall-clock seconds per tick
    #[arg(long, value_name = "SECONDS", default_value = "0.016666668")]
    pub dt: f32,

    /// World position to query after the last tick (repeatable)
    #[arg(long, num_args = 2, value_names = ["X", "Z"], action = clap::ArgAction::Append, allow_negative_numbers = true)]
    pub sample: Vec<f32>,

    /// Synthesize with the direct DFT instead of the FFT
    #[arg(long)]
    pub direct: bool,

    /// Run the FFT channels on the calling thread
    #[arg(long)]
    pub serial: bool,

    /// Keep only the height channel (no horizontal displacement)
    #[arg(long)]
    pub no_displacement: bool,

    /// Write a grayscale PNG heightmap of the final tick
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of a loaded (or default) configuration
    pub fn apply_overrides(&self, config: &mut OceanConfig) {
        let ocean = &mut config.ocean;
        if let Some(grid_size) = self.grid_size {
            ocean.grid_size = grid_size;
        }
        if let Some(wind) = self.wind.as_deref().and_then(pair) {
            ocean.wind_factor = wind;
        }
        if let Some(wave_height) = self.wave_height {
            ocean.wave_height = wave_height;
        }
        if let Some(gravity) = self.gravity {
            ocean.gravitational_pull = gravity;
        }
        if let Some(distance) = self.vertex_distance.as_deref().and_then(pair) {
            ocean.vertex_distance = distance;
        }
        if let Some(instances) = self.instances {
            ocean.instance_count = instances;
        }
        if self.direct {
            ocean.backend = SynthesisBackend::Direct;
        }
        if self.serial {
            ocean.parallelism = Parallelism::Serial;
        }
        if self.no_displacement {
            ocean.displacement = false;
        }
        *ocean = ocean.sanitized();
    }

    /// Query positions as `(x, z)` pairs
    pub fn parse_samples(&self) -> Vec<Vec2> {
        self.sample
            .chunks_exact(2)
            .map(|xz| Vec2::new(xz[0], xz[1]))
            .collect()
    }
}

fn pair(values: &[f32]) -> Option<Vec2> {
    match values {
        [x, z] => Some(Vec2::new(*x, *z)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::parse_from(["tidemill"]);
        let mut config = OceanConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config, OceanConfig::default());
        assert_eq!(args.ticks, 60);
        assert!(args.parse_samples().is_empty());
    }

    #[test]
    fn test_overrides_apply() {
        let args = Args::parse_from([
            "tidemill",
            "--grid-size",
            "32",
            "--wind",
            "58",
            "-58",
            "--wave-height",
            "0.00005",
            "--instances",
            "3",
            "--direct",
            "--serial",
            "--no-displacement",
        ]);
        let mut config = OceanConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.ocean.grid_size, 32);
        assert_eq!(config.ocean.wind_factor, Vec2::new(58.0, -58.0));
        assert_eq!(config.ocean.wave_height, 0.00005);
        assert_eq!(config.ocean.instance_count, 3);
        assert_eq!(config.ocean.backend, SynthesisBackend::Direct);
        assert_eq!(config.ocean.parallelism, Parallelism::Serial);
        assert!(!config.ocean.displacement);
    }

    #[test]
    fn test_invalid_overrides_are_sanitized() {
        let args = Args::parse_from(["tidemill", "--grid-size", "100", "--instances", "-2"]);
        let mut config = OceanConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.ocean.grid_size, 64);
        assert_eq!(config.ocean.instance_count, 1);
    }

    #[test]
    fn test_samples_are_paired() {
        let args = Args::parse_from(["tidemill", "--sample", "1", "2", "--sample", "-3.5", "4"]);
        assert_eq!(
            args.parse_samples(),
            vec![Vec2::new(1.0, 2.0), Vec2::new(-3.5, 4.0)]
        );
    }
}
