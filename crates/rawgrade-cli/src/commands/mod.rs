//! CLI command implementations

pub mod backends;
pub mod factors;
pub mod luts;
pub mod render;

use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageBuffer, Rgba};

use rawgrade_compute::RasterImage;

/// Load image from path as RGBA float.
pub fn load_image(path: &Path) -> Result<RasterImage> {
    let decoded = image::open(path)
        .with_context(|| format!("Failed to load: {}", path.display()))?
        .to_rgba32f();
    let (w, h) = decoded.dimensions();
    RasterImage::from_rgba(w, h, decoded.into_raw())
        .with_context(|| format!("Invalid pixel buffer in {}", path.display()))
}

/// Save image to path. TIFF keeps 16 bits per channel, JPEG drops alpha,
/// everything else is 8-bit RGBA.
pub fn save_image(path: &Path, raster: &RasterImage) -> Result<()> {
    let (w, h) = raster.dimensions();
    let buffer: ImageBuffer<Rgba<f32>, Vec<f32>> = ImageBuffer::from_raw(w, h, clamped(raster))
        .context("Output buffer does not match its dimensions")?;
    let dynamic = DynamicImage::ImageRgba32F(buffer);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let result = match ext.as_str() {
        "tif" | "tiff" => dynamic.to_rgba16().save(path),
        "jpg" | "jpeg" => dynamic.to_rgb8().save(path),
        _ => dynamic.to_rgba8().save(path),
    };
    result.with_context(|| format!("Failed to save: {}", path.display()))
}

fn clamped(raster: &RasterImage) -> Vec<f32> {
    raster.data().iter().map(|v| v.clamp(0.0, 1.0)).collect()
}
