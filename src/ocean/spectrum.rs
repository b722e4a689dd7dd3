//! Directional Phillips spectrum and the initial amplitudes `h0(k)`.
//!
//! Every Gaussian draw is a pure function of `(seed, x, z)`, so sampling the
//! same cell twice yields the same amplitude. This keeps resets reproducible
//! and lets the conjugate sample of a cell be recomputed independently.

use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::dispersion::Dispersion;
use crate::complex::Complex;
use crate::params::{ConjugateSampling, OceanParams, WaveVectorScale};

/// Fraction of the largest wave length below which small waves are damped
pub const PHILLIPS_DAMPING: f32 = 0.001;

/// Wavevectors shorter than this carry no energy
pub const WAVE_NUMBER_EPSILON: f32 = 1.0e-6;

/// Spectrum generator for one parameter set
#[derive(Debug, Clone)]
pub struct Spectrum {
    grid_size: usize,
    vertex_distance: Vec2,
    gravitational_pull: f32,
    wave_height: f32,
    wind_factor: Vec2,
    seed: u64,
    scale: WaveVectorScale,
    sampling: ConjugateSampling,
    dispersion: Dispersion,
}

impl Spectrum {
    pub fn new(params: &OceanParams) -> Self {
        Self {
            grid_size: params.grid_size,
            vertex_distance: params.vertex_distance,
            gravitational_pull: params.gravitational_pull,
            wave_height: params.wave_height,
            wind_factor: params.wind_factor,
            seed: params.seed,
            scale: params.wave_vector,
            sampling: params.conjugate_sampling,
            dispersion: Dispersion::new(params.gravitational_pull, params.base_frequency()),
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Wavevector of grid index `(x, z)`, centred so that `(N/2, N/2)` is DC
    ///
    /// Indices outside `[0, N)` are valid and extend the same linear mapping.
    pub fn wave_vector(&self, x: i32, z: i32) -> Vec2 {
        let half = self.grid_size as f32 / 2.0;
        let factor = self.scale.factor();
        Vec2::new(
            factor * (x as f32 - half) / self.vertex_distance.x,
            factor * (z as f32 - half) / self.vertex_distance.y,
        )
    }

    /// Largest wave arising from a continuous wind, `L = |wind|² / g`
    pub fn largest_wave_length(&self) -> f32 {
        self.wind_factor.length_squared() / self.gravitational_pull
    }

    /// Phillips spectrum energy at grid index `(x, z)`
    pub fn phillips(&self, x: i32, z: i32) -> f32 {
        let k = self.wave_vector(x, z);
        let k_len = k.length();
        if k_len < WAVE_NUMBER_EPSILON {
            return 0.0;
        }
        if !(self.gravitational_pull > 0.0) || self.wind_factor.length_squared() <= 0.0 {
            return 0.0;
        }

        let k_len_sq = k_len * k_len;
        let k_dot_wind = (k / k_len).dot(self.wind_factor.normalize());

        let largest = self.largest_wave_length();
        let largest_sq = largest * largest;
        let small_wave_sq = largest_sq * PHILLIPS_DAMPING * PHILLIPS_DAMPING;

        self.wave_height * (-1.0 / (k_len_sq * largest_sq)).exp() / (k_len_sq * k_len_sq)
            * (k_dot_wind * k_dot_wind)
            * (-k_len_sq * small_wave_sq).exp()
    }

    /// Standard complex Gaussian draw for cell `(x, z)` (polar rejection method)
    pub fn gaussian(&self, x: i32, z: i32) -> Complex {
        let mut rng = StdRng::seed_from_u64(cell_seed(self.seed, x, z));
        loop {
            let x1: f32 = rng.gen_range(-1.0..1.0);
            let x2: f32 = rng.gen_range(-1.0..1.0);
            let radius_sq = x1 * x1 + x2 * x2;
            if radius_sq < 1.0 && radius_sq > 0.0 {
                let scale = (-2.0 * radius_sq.ln() / radius_sq).sqrt();
                return Complex::new(x1 * scale, x2 * scale);
            }
        }
    }

    /// `h0(k) = gaussian * sqrt(P(k) / 2)`
    pub fn h_tilde_0(&self, x: i32, z: i32) -> Complex {
        let energy = self.phillips(x, z).max(0.0);
        self.gaussian(x, z).scale((energy / 2.0).sqrt())
    }

    /// Conjugate companion sample cached next to `h0(x, z)`
    pub fn h_tilde_0_conjugate(&self, x: i32, z: i32) -> Complex {
        match self.sampling {
            ConjugateSampling::Negated => self.h_tilde_0(-x, -z).conjugate(),
            ConjugateSampling::Same => self.h_tilde_0(x, z).conjugate(),
        }
    }

    /// Quantized angular frequency at grid index `(x, z)` (rad/s)
    pub fn dispersion(&self, x: i32, z: i32) -> f32 {
        self.angular_frequency(x, z) as f32
    }

    pub(crate) fn angular_frequency(&self, x: i32, z: i32) -> f64 {
        self.dispersion.angular_frequency(self.wave_vector(x, z))
    }
}

/// Mix the global seed with a cell index into an independent stream seed
fn cell_seed(seed: u64, x: i32, z: i32) -> u64 {
    let cell = ((x as u32 as u64) << 32) | (z as u32 as u64);
    let mut h = seed ^ cell.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 31)
}
