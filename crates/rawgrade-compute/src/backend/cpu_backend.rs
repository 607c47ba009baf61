//! CPU backend using rayon for parallelization.
//!
//! These kernels are the reference the GPU shaders are checked against.

use rayon::prelude::*;
use tracing::trace;

use rawgrade_lut::Lut3D;

use super::{ComputeBackend, GpuLimits};
use crate::{ComputeError, ComputeResult, RasterImage};

/// Above this intensity the LUT output is used as-is, without a crossfade.
pub(crate) const FULL_INTENSITY: f32 = 0.999;

/// CPU processing backend.
pub struct CpuBackend {
    limits: GpuLimits,
}

impl CpuBackend {
    pub fn new() -> Self {
        // Get system RAM (fallback to 4GB if detection fails)
        let available = sys_info::mem_info()
            .map(|m| m.avail * 1024)
            .unwrap_or(4 * 1024 * 1024 * 1024);

        // Same texture ceiling as the wgpu default.
        Self {
            limits: GpuLimits {
                available_memory: available,
                max_buffer_bytes: u64::MAX,
                ..GpuLimits::default()
            },
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn limits(&self) -> &GpuLimits {
        &self.limits
    }

    fn apply_lut3d(&self, image: &RasterImage, lut: &Lut3D, intensity: f32) -> ComputeResult<RasterImage> {
        let (w, h) = image.dimensions();
        let t = intensity.clamp(0.0, 1.0);
        trace!(width = w, height = h, dimension = lut.dimension(), intensity = t, "cpu lut3d");

        let mut out = image.clone();
        out.data_mut()
            .par_chunks_mut(RasterImage::CHANNELS)
            .for_each(|px| {
                let mapped = lut.sample([px[0], px[1], px[2]]);
                if t >= FULL_INTENSITY {
                    px[..3].copy_from_slice(&mapped);
                } else {
                    for c in 0..3 {
                        px[c] += (mapped[c] - px[c]) * t;
                    }
                }
            });
        Ok(out)
    }

    fn upscale(&self, image: &RasterImage, width: u32, height: u32) -> ComputeResult<RasterImage> {
        if image.is_empty() || width == 0 || height == 0 {
            return Err(ComputeError::InvalidDimensions(width, height));
        }
        trace!(src_w = image.width(), src_h = image.height(), dst_w = width, dst_h = height, "cpu upscale");

        let scale_x = image.width() as f32 / width as f32;
        let scale_y = image.height() as f32 / height as f32;
        let row_len = width as usize * RasterImage::CHANNELS;

        let mut data = vec![0.0f32; row_len * height as usize];
        data.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(RasterImage::CHANNELS).enumerate() {
                    px.copy_from_slice(&upscale_pixel(image, x as u32, y as u32, scale_x, scale_y));
                }
            });

        RasterImage::from_rgba(width, height, data)
    }
}

fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        -0.5 * t3 + t2 - 0.5 * t,
        1.5 * t3 - 2.5 * t2 + 1.0,
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,
        0.5 * t3 - 0.5 * t2,
    ]
}

/// Catmull-Rom reconstruction over a 4x4 footprint, clamped to the range of
/// the inner 2x2 texels so edges do not ring.
pub(crate) fn upscale_pixel(src: &RasterImage, x: u32, y: u32, scale_x: f32, scale_y: f32) -> [f32; 4] {
    let sx = (x as f32 + 0.5) * scale_x - 0.5;
    let sy = (y as f32 + 0.5) * scale_y - 0.5;
    let fx = sx.floor();
    let fy = sy.floor();
    let wx = catmull_rom_weights(sx - fx);
    let wy = catmull_rom_weights(sy - fy);
    let (ix, iy) = (fx as i64, fy as i64);

    let mut acc = [0.0f32; 4];
    let mut lo = [f32::MAX; 4];
    let mut hi = [f32::MIN; 4];

    for (j, wy) in wy.iter().enumerate() {
        for (i, wx) in wx.iter().enumerate() {
            let p = src.pixel_clamped(ix - 1 + i as i64, iy - 1 + j as i64);
            let w = wx * wy;
            let inner = (1..=2).contains(&i) && (1..=2).contains(&j);
            for c in 0..4 {
                acc[c] += p[c] * w;
                if inner {
                    lo[c] = lo[c].min(p[c]);
                    hi[c] = hi[c].max(p[c]);
                }
            }
        }
    }

    for c in 0..4 {
        acc[c] = acc[c].clamp(lo[c], hi[c]);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_weights_partition_unity() {
        for t in [0.0, 0.25, 0.5, 0.9] {
            let sum: f32 = catmull_rom_weights(t).iter().sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_flat_image_stays_flat() {
        let img = RasterImage::from_rgba(3, 2, [0.3, 0.5, 0.7, 1.0].repeat(6)).unwrap();
        let out = CpuBackend::new().upscale(&img, 6, 4).unwrap();
        for px in out.data().chunks(4) {
            assert_abs_diff_eq!(px[0], 0.3, epsilon = 1e-6);
            assert_abs_diff_eq!(px[2], 0.7, epsilon = 1e-6);
            assert_abs_diff_eq!(px[3], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_step_edge_does_not_overshoot() {
        // Left half black, right half white
        let mut data = Vec::new();
        for _y in 0..4 {
            for x in 0..8 {
                let v = if x < 4 { 0.0 } else { 1.0 };
                data.extend_from_slice(&[v, v, v, 1.0]);
            }
        }
        let img = RasterImage::from_rgba(8, 4, data).unwrap();
        let out = CpuBackend::new().upscale(&img, 24, 12).unwrap();
        assert!(out.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_lut_intensity_zero_is_identity() {
        let img = RasterImage::from_rgba(2, 1, vec![0.1, 0.2, 0.3, 0.5, 1.2, -0.1, 0.4, 1.0]).unwrap();
        let invert = Lut3D::generate(9, |r, g, b| [1.0 - r, 1.0 - g, 1.0 - b]);
        let out = CpuBackend::new().apply_lut3d(&img, &invert, 0.0).unwrap();
        assert_eq!(out, img);
    }
}
