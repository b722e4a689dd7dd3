//! Grayscale PNG snapshots of the synthesized height field.

use std::path::Path;

use thiserror::Error;

use super::field::WaveField;

/// Heightmap export failure
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write heightmap: {0}")]
    Image(#[from] image::ImageError),
}

/// One byte per render vertex, heights mapped linearly from `[min, max]` to `[0, 255]`
///
/// A flat field maps to mid-gray.
pub fn heightmap_luma(field: &WaveField) -> (Vec<u8>, u32) {
    let side = field.grid_size() + 1;
    let heights: Vec<f32> = field.vertices().iter().map(|v| v.position[1]).collect();

    let (min, max) = heights
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });
    let range = max - min;

    let pixels = heights
        .iter()
        .map(|&h| {
            if range > f32::EPSILON {
                ((h - min) / range * 255.0).round() as u8
            } else {
                128
            }
        })
        .collect();
    (pixels, side as u32)
}

/// Write the current heights as a `(N+1) × (N+1)` grayscale PNG
pub fn save_heightmap(field: &WaveField, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let (pixels, side) = heightmap_luma(field);
    image::save_buffer(path.as_ref(), &pixels, side, side, image::ColorType::L8)?;
    log::info!("Saved heightmap: {}", path.as_ref().display());
    Ok(())
}
