//! Minimal complex arithmetic used by the spectrum and synthesis stages.
//!
//! The FFT backend has its own complex type (`num_complex::Complex32`); the
//! conversions at the bottom of this file are the only place the two meet.

use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub};

use rustfft::num_complex::Complex32;

/// Single-precision complex value (real, imaginary)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex {
    pub real: f32,
    pub imag: f32,
}

impl Complex {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(real: f32, imag: f32) -> Self {
        Self { real, imag }
    }

    /// Unit phasor `cos(theta) + i sin(theta)`
    pub fn from_phase(theta: f32) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(cos, sin)
    }

    /// Pure imaginary value `i * imag`
    pub const fn imaginary(imag: f32) -> Self {
        Self::new(0.0, imag)
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.real, -self.imag)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.real * factor, self.imag * factor)
    }

    /// Squared magnitude
    pub fn norm_sqr(self) -> f32 {
        self.real * self.real + self.imag * self.imag
    }

    pub fn norm(self) -> f32 {
        self.norm_sqr().sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.real.is_finite() && self.imag.is_finite()
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.real + rhs.real, self.imag + rhs.imag)
    }
}

impl AddAssign for Complex {
    fn add_assign(&mut self, rhs: Self) {
        self.real += rhs.real;
        self.imag += rhs.imag;
    }
}

impl Sub for Complex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.real - rhs.real, self.imag - rhs.imag)
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.real * rhs.real - self.imag * rhs.imag,
            self.real * rhs.imag + self.imag * rhs.real,
        )
    }
}

impl MulAssign for Complex {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<f32> for Complex {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Complex {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.real, -self.imag)
    }
}

impl From<Complex32> for Complex {
    fn from(value: Complex32) -> Self {
        Self::new(value.re, value.im)
    }
}

impl From<Complex> for Complex32 {
    fn from(value: Complex) -> Self {
        Complex32::new(value.real, value.imag)
    }
}
