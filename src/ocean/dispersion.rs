//! Deep-water dispersion and time evolution of spectrum amplitudes.

use glam::Vec2;

use crate::complex::Complex;

/// Deep-water dispersion relation `ω(k) = sqrt(g |k|)`, quantized to multiples of `ω₀`
///
/// Quantizing every frequency to a multiple of `ω₀ = 2π / T_repeat` makes the
/// whole field periodic with period `T_repeat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    gravitational_pull: f32,
    base_frequency: f64,
}

impl Dispersion {
    pub fn new(gravitational_pull: f32, base_frequency: f64) -> Self {
        Self {
            gravitational_pull,
            base_frequency,
        }
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    /// Loop period `T_repeat = 2π / ω₀` (seconds)
    pub fn repeat_period(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.base_frequency
    }

    /// Unquantized angular frequency for wavevector `k` (rad/s)
    pub fn continuous_frequency(&self, k: Vec2) -> f64 {
        let g = self.gravitational_pull.max(0.0) as f64;
        (g * k.length() as f64).sqrt()
    }

    /// Angular frequency rounded down to a multiple of the base frequency (rad/s)
    pub fn angular_frequency(&self, k: Vec2) -> f64 {
        if !(self.base_frequency > 0.0) {
            return self.continuous_frequency(k);
        }
        (self.continuous_frequency(k) / self.base_frequency).floor() * self.base_frequency
    }
}

/// `h(k, t) = h0(k) e^{iωt} + conj(h0(-k)) e^{-iωt}`
///
/// `cos` and `sin` are evaluated once and shared by both terms. The phase is
/// reduced in double precision so long-running simulations stay periodic.
pub fn evolve(h0: Complex, h0_conjugate: Complex, omega: f64, time_s: f64) -> Complex {
    let phase = (omega * time_s).rem_euclid(std::f64::consts::TAU);
    let (sin, cos) = phase.sin_cos();
    let forward = Complex::new(cos as f32, sin as f32);
    let backward = forward.conjugate();
    h0 * forward + h0_conjugate * backward
}
