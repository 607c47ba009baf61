//! Luminance sharpening and noise reduction.
//!
//! Both work on a luminance plane and add the luma change back to every
//! channel equally, so color is not shifted.

use rayon::prelude::*;

use rawgrade_compute::RasterImage;

use super::{luma, smoothstep};

/// Blur radius of the unsharp mask.
const SHARPEN_RADIUS: usize = 1;
/// Blur radius of the denoiser.
const DENOISE_RADIUS: usize = 2;

fn luminance_plane(image: &RasterImage) -> Vec<f32> {
    image
        .data()
        .par_chunks(RasterImage::CHANNELS)
        .map(|px| luma([px[0], px[1], px[2]]))
        .collect()
}

/// Separable box blur with clamped edges.
fn box_blur(plane: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    let norm = 1.0 / (2 * radius + 1) as f32;
    let r = radius as isize;

    let mut horizontal = vec![0.0f32; plane.len()];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let src = &plane[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for dx in -r..=r {
                    let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
                    sum += src[sx];
                }
                *out = sum * norm;
            }
        });

    let mut out = vec![0.0f32; plane.len()];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, value) in row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for dy in -r..=r {
                    let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
                    sum += horizontal[sy * width + x];
                }
                *value = sum * norm;
            }
        });
    out
}

/// Adds `delta(luma, blurred)` to each pixel's RGB.
fn apply_luma_delta(image: &mut RasterImage, radius: usize, delta: impl Fn(f32, f32) -> f32 + Sync) {
    let (w, h) = (image.width() as usize, image.height() as usize);
    if w == 0 || h == 0 {
        return;
    }
    let plane = luminance_plane(image);
    let blurred = box_blur(&plane, w, h, radius);

    image
        .data_mut()
        .par_chunks_mut(RasterImage::CHANNELS)
        .enumerate()
        .for_each(|(i, px)| {
            let d = delta(plane[i], blurred[i]);
            px[0] += d;
            px[1] += d;
            px[2] += d;
        });
}

/// Unsharp mask on luminance.
pub(super) fn sharpen(image: &mut RasterImage, amount: f32) {
    apply_luma_delta(image, SHARPEN_RADIUS, |l, blur| (l - blur) * amount);
}

/// Box denoise on luminance.
///
/// Detail smaller than `level` is treated as noise and smoothed away; what
/// survives is amplified by `sharpness`.
pub(super) fn noise_reduction(image: &mut RasterImage, level: f32, sharpness: f32) {
    apply_luma_delta(image, DENOISE_RADIUS, |l, blur| {
        let detail = l - blur;
        let keep = if level > 0.0 { smoothstep(0.0, level, detail.abs()) } else { 1.0 };
        blur + detail * keep * (1.0 + sharpness) - l
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn flat(v: f32) -> RasterImage {
        RasterImage::from_rgba(5, 4, [v, v, v, 1.0].repeat(20)).unwrap()
    }

    #[test]
    fn test_blur_flat_plane() {
        let plane = vec![0.3; 12];
        for v in box_blur(&plane, 4, 3, 2) {
            assert_abs_diff_eq!(v, 0.3, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_sharpen_flat_is_noop() {
        let mut img = flat(0.4);
        sharpen(&mut img, 2.0);
        for &v in img.data() {
            assert!(v == 1.0 || (v - 0.4).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sharpen_increases_edge_contrast() {
        let mut data = Vec::new();
        for _y in 0..3 {
            for x in 0..6 {
                let v = if x < 3 { 0.2 } else { 0.8 };
                data.extend_from_slice(&[v, v, v, 1.0]);
            }
        }
        let mut img = RasterImage::from_rgba(6, 3, data).unwrap();
        sharpen(&mut img, 1.0);
        let row = &img.data()[..6 * 4];
        assert!(row[2 * 4] < 0.2);
        assert!(row[3 * 4] > 0.8);
    }

    #[test]
    fn test_denoise_removes_small_speck() {
        let mut img = flat(0.5);
        let center = (2 * 5 + 2) * 4;
        for c in 0..3 {
            img.data_mut()[center + c] = 0.51;
        }
        noise_reduction(&mut img, 0.05, 0.0);
        assert!((img.data()[center] - 0.5).abs() < 0.01 * 0.5);
    }
}
