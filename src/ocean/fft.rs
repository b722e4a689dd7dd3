//! Inverse 2D FFT channel built on rustfft.
//!
//! Each channel owns its planner output, scratch space and output buffer, so
//! five channels can be transformed concurrently without sharing state.

use std::sync::Arc;

use log::warn;
use rustfft::{num_complex::Complex32, Fft, FftPlanner};

use crate::complex::Complex;

/// One square inverse FFT with an owned spatial output buffer (row-major, `z * N + x`)
pub struct FftChannel {
    size: usize,
    plan: Option<Arc<dyn Fft<f32>>>,
    output: Vec<Complex32>,
    column: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl FftChannel {
    /// Plan an inverse transform of `size × size`
    ///
    /// Sizes the backend cannot plan produce a channel that skips every transform.
    pub fn new(size: usize) -> Self {
        let plan = if size >= 2 && size.is_power_of_two() {
            let mut planner = FftPlanner::new();
            Some(planner.plan_fft_inverse(size))
        } else {
            warn!(
                "Failed to plan a {}x{} inverse FFT, this channel will not be updated",
                size, size
            );
            None
        };
        Self::with_plan(size, plan)
    }

    pub(crate) fn with_plan(size: usize, plan: Option<Arc<dyn Fft<f32>>>) -> Self {
        let scratch_len = plan
            .as_ref()
            .map_or(0, |plan| plan.get_inplace_scratch_len());
        Self {
            size,
            plan,
            output: vec![Complex32::new(0.0, 0.0); size * size],
            column: vec![Complex32::new(0.0, 0.0); size],
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
        }
    }

    pub fn is_planned(&self) -> bool {
        self.plan.is_some()
    }

    /// Inverse-transform `spectrum` (unnormalized) into the output buffer
    ///
    /// Returns `false` and leaves the previous output untouched when the
    /// channel has no plan.
    pub fn transform(&mut self, spectrum: &[Complex]) -> bool {
        let Some(plan) = self.plan.as_ref() else {
            return false;
        };
        let n = self.size;
        debug_assert_eq!(spectrum.len(), n * n);

        for (dst, src) in self.output.iter_mut().zip(spectrum) {
            *dst = (*src).into();
        }

        // Rows are contiguous, rustfft transforms each chunk of length n
        plan.process_with_scratch(&mut self.output, &mut self.scratch);

        for x in 0..n {
            for z in 0..n {
                self.column[z] = self.output[z * n + x];
            }
            plan.process_with_scratch(&mut self.column, &mut self.scratch);
            for z in 0..n {
                self.output[z * n + x] = self.column[z];
            }
        }
        true
    }

    /// Spatial value at row-major `index`
    pub fn value(&self, index: usize) -> Complex {
        self.output[index].into()
    }

    pub fn output(&self) -> &[Complex32] {
        &self.output
    }
}
