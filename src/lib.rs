//! tidemill library - FFT ocean wave synthesis

pub mod cli;
pub mod complex;
pub mod jobs;
pub mod ocean;
pub mod params;
