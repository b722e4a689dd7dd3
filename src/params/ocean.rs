//! Ocean simulation parameters and the grid-size allow-list.

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

/// Grid sizes the synthesizer accepts (power-of-two FFT lengths)
pub const GRID_SIZES: [usize; 10] = [2, 4, 8, 16, 32, 64, 128, 256, 512, 1024];

/// Substituted when a requested grid size is not in [`GRID_SIZES`]
pub const DEFAULT_GRID_SIZE: usize = 64;

/// Smallest accepted tile extent along either axis (meters)
pub const MIN_VERTEX_DISTANCE: f32 = 1.0;

/// Smallest accepted number of instances per side
pub const MIN_INSTANCE_COUNT: i32 = 1;

/// Largest accepted number of instances per side
pub const MAX_INSTANCE_COUNT: i32 = 64;

/// Time dilation values below this are rejected
pub const MIN_TIME_DILATION: f32 = 1.0e-4;

/// Default loop period of the whole field (seconds)
pub const DEFAULT_REPEAT_PERIOD_S: f32 = 200.0;

/// Where the conjugate spectrum sample of each cell is taken from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConjugateSampling {
    /// `conj(h0(-x, -z))`
    #[default]
    Negated,
    /// `conj(h0(x, z))`
    Same,
}

/// Mapping from grid index to wavevector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveVectorScale {
    /// `k = 2π (i - N/2) / L`
    #[default]
    FullTurn,
    /// `k = π (i - N/2) / L` ("new K" convention)
    HalfTurn,
}

impl WaveVectorScale {
    pub fn factor(self) -> f32 {
        match self {
            Self::FullTurn => 2.0 * std::f32::consts::PI,
            Self::HalfTurn => std::f32::consts::PI,
        }
    }
}

/// How the spatial field is produced from the spectrum
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisBackend {
    /// Five inverse 2D FFTs
    #[default]
    Fft,
    /// Brute-force sum over every frequency per vertex (small grids only)
    Direct,
}

/// Whether the five FFT channels run on worker threads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    #[default]
    Threads,
    Serial,
}

/// Ocean simulation parameters
///
/// Changing any of the spectrum-shaping fields (grid size, tile extent,
/// gravity, wind, wave height, seed, sampling modes) invalidates every derived
/// array; [`crate::ocean::OceanSystem`] applies such changes at the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanParams {
    /// Cells per side of the simulated tile (one of [`GRID_SIZES`])
    pub grid_size: usize,

    /// World extent of one tile along x and z (meters)
    pub vertex_distance: Vec2,

    /// Gravitational acceleration used by the spectrum and dispersion (m/s²)
    pub gravitational_pull: f32,

    /// Phillips spectrum amplitude scale (dimensionless)
    pub wave_height: f32,

    /// Wind direction times speed (m/s)
    pub wind_factor: Vec2,

    /// Simulation seconds per wall-clock second
    pub time_dilation: f32,

    /// The field repeats exactly after this many simulation seconds
    pub repeat_period_s: f32,

    /// Tiles per side of the instanced grid
    pub instance_count: i32,

    /// Seed of the per-cell Gaussian draws
    pub seed: u64,

    pub conjugate_sampling: ConjugateSampling,

    pub wave_vector: WaveVectorScale,

    /// Apply choppy horizontal displacement (false keeps only the height channel)
    pub displacement: bool,

    pub backend: SynthesisBackend,

    pub parallelism: Parallelism,

    /// Ticks skipped between two synthesis passes (0 = synthesize every tick)
    pub step_interval: u32,
}

impl Default for OceanParams {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            vertex_distance: Vec2::splat(DEFAULT_GRID_SIZE as f32),
            gravitational_pull: 9.81,
            wave_height: 0.0005,
            wind_factor: Vec2::new(32.0, 32.0),
            time_dilation: 1.0,
            repeat_period_s: DEFAULT_REPEAT_PERIOD_S,
            instance_count: 1,
            seed: 100,
            conjugate_sampling: ConjugateSampling::default(),
            wave_vector: WaveVectorScale::default(),
            displacement: true,
            backend: SynthesisBackend::default(),
            parallelism: Parallelism::default(),
            step_interval: 0,
        }
    }
}

/// Whether `size` is one of the accepted grid sizes
pub fn is_valid_grid_size(size: usize) -> bool {
    GRID_SIZES.contains(&size)
}

/// Returns `size` if accepted, otherwise logs and substitutes [`DEFAULT_GRID_SIZE`]
pub fn validate_grid_size(size: usize) -> usize {
    if is_valid_grid_size(size) {
        size
    } else {
        warn!(
            "Grid size {} is not a power of two in {:?}, using {}",
            size, GRID_SIZES, DEFAULT_GRID_SIZE
        );
        DEFAULT_GRID_SIZE
    }
}

/// Clamps each tile extent component to [`MIN_VERTEX_DISTANCE`]
pub fn validate_vertex_distance(distance: Vec2) -> Vec2 {
    // NaN fails the comparison and is clamped as well
    if distance.x >= MIN_VERTEX_DISTANCE && distance.y >= MIN_VERTEX_DISTANCE {
        return distance;
    }
    let clamp = |v: f32| {
        if v >= MIN_VERTEX_DISTANCE {
            v
        } else {
            MIN_VERTEX_DISTANCE
        }
    };
    let clamped = Vec2::new(clamp(distance.x), clamp(distance.y));
    warn!(
        "Vertex distance must be at least {}, clamped {:?} to {:?}",
        MIN_VERTEX_DISTANCE, distance, clamped
    );
    clamped
}

/// Clamps the instanced grid to `[MIN_INSTANCE_COUNT, MAX_INSTANCE_COUNT]` tiles per side
pub fn validate_instance_count(count: i32) -> i32 {
    if count < MIN_INSTANCE_COUNT {
        warn!(
            "Instancing amount cannot be below {}, clamped {} to {}",
            MIN_INSTANCE_COUNT, count, MIN_INSTANCE_COUNT
        );
        MIN_INSTANCE_COUNT
    } else if count > MAX_INSTANCE_COUNT {
        warn!(
            "Instancing amount cannot exceed {}, clamped {} to {}",
            MAX_INSTANCE_COUNT, count, MAX_INSTANCE_COUNT
        );
        MAX_INSTANCE_COUNT
    } else {
        count
    }
}

impl OceanParams {
    /// Apply every local recovery rule, logging each substitution
    pub fn sanitized(mut self) -> Self {
        self.grid_size = validate_grid_size(self.grid_size);
        self.vertex_distance = validate_vertex_distance(self.vertex_distance);
        self.instance_count = validate_instance_count(self.instance_count);

        if !(self.time_dilation >= MIN_TIME_DILATION) {
            warn!(
                "Time dilation {} is below {}, using 1.0",
                self.time_dilation, MIN_TIME_DILATION
            );
            self.time_dilation = 1.0;
        }
        if !(self.repeat_period_s > 0.0) {
            warn!(
                "Repeat period {} must be positive, using {}",
                self.repeat_period_s, DEFAULT_REPEAT_PERIOD_S
            );
            self.repeat_period_s = DEFAULT_REPEAT_PERIOD_S;
        }
        self
    }

    /// World spacing between neighbouring vertices along x and z
    pub fn cell_size(&self) -> Vec2 {
        self.vertex_distance / self.grid_size as f32
    }

    /// Instances per side as an index count
    pub fn instances_per_side(&self) -> usize {
        self.instance_count
            .clamp(MIN_INSTANCE_COUNT, MAX_INSTANCE_COUNT) as usize
    }

    /// Base angular frequency `ω₀ = 2π / T_repeat` (rad/s)
    pub fn base_frequency(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.repeat_period_s as f64
    }

    /// Whether switching from `self` to `other` requires regenerating the spectrum
    pub fn requires_reset(&self, other: &Self) -> bool {
        self.grid_size != other.grid_size
            || self.vertex_distance != other.vertex_distance
            || self.gravitational_pull != other.gravitational_pull
            || self.wave_height != other.wave_height
            || self.wind_factor != other.wind_factor
            || self.repeat_period_s != other.repeat_period_s
            || self.seed != other.seed
            || self.conjugate_sampling != other.conjugate_sampling
            || self.wave_vector != other.wave_vector
    }
}
