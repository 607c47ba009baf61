//! Exposure, tone zones and the brightness/contrast/saturation block.

use rawgrade_compute::RasterImage;

use super::{luma, map_rgb, smoothstep};

/// Gain of `2^ev`.
pub(super) fn exposure(image: &mut RasterImage, ev: f32) {
    let gain = 2.0_f32.powf(ev);
    map_rgb(image, |[r, g, b]| [r * gain, g * gain, b * gain]);
}

/// Luminance-zone compression.
///
/// The highlight zone is weighted by a smoothstep over luma [0.5, 1] and
/// scaled by `highlights` (1 is neutral). The shadow zone is weighted by the
/// complementary ramp over [0, 0.5] and lifted additively by `shadows`.
/// The luma change is added equally to each channel.
pub(super) fn highlights_shadows(image: &mut RasterImage, highlights: f32, shadows: f32) {
    map_rgb(image, |rgb| {
        let l = luma(rgb).clamp(0.0, 1.0);
        let hw = smoothstep(0.5, 1.0, l);
        let sw = 1.0 - smoothstep(0.0, 0.5, l);

        let delta = (highlights - 1.0) * hw * l * 0.5 + shadows * sw * 0.25;
        [rgb[0] + delta, rgb[1] + delta, rgb[2] + delta]
    });
}

/// Brightness add, contrast around 0.5, then saturation toward luma.
pub(super) fn basic_color(image: &mut RasterImage, brightness: f32, contrast: f32, saturation: f32) {
    map_rgb(image, |rgb| {
        let c = rgb.map(|v| (v + brightness - 0.5) * contrast + 0.5);
        let l = luma(c);
        c.map(|v| l + (v - l) * saturation)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn px(rgb: [f32; 3]) -> RasterImage {
        RasterImage::from_rgba(1, 1, vec![rgb[0], rgb[1], rgb[2], 0.5]).unwrap()
    }

    #[test]
    fn test_exposure_one_stop_doubles() {
        let mut img = px([0.1, 0.2, 0.3]);
        exposure(&mut img, 1.0);
        assert_abs_diff_eq!(img.data()[2], 0.6, epsilon = 1e-6);
        assert_eq!(img.data()[3], 0.5);
    }

    #[test]
    fn test_highlights_compress_bright_only() {
        let mut bright = px([0.95, 0.95, 0.95]);
        highlights_shadows(&mut bright, 0.5, 0.0);
        assert!(bright.data()[0] < 0.95);

        let mut dark = px([0.2, 0.2, 0.2]);
        highlights_shadows(&mut dark, 0.5, 0.0);
        assert_abs_diff_eq!(dark.data()[0], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_shadows_lift_dark_only() {
        let mut dark = px([0.1, 0.1, 0.1]);
        highlights_shadows(&mut dark, 1.0, 0.5);
        assert!(dark.data()[0] > 0.1);

        let mut bright = px([0.8, 0.8, 0.8]);
        highlights_shadows(&mut bright, 1.0, 0.5);
        assert_abs_diff_eq!(bright.data()[0], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_contrast_pivots_on_mid_grey() {
        let mut grey = px([0.5, 0.5, 0.5]);
        basic_color(&mut grey, 0.0, 2.0, 1.0);
        assert_abs_diff_eq!(grey.data()[0], 0.5, epsilon = 1e-6);

        let mut img = px([0.75, 0.5, 0.25]);
        basic_color(&mut img, 0.0, 2.0, 1.0);
        assert_abs_diff_eq!(img.data()[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(img.data()[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_saturation_is_grey() {
        let mut img = px([0.9, 0.3, 0.1]);
        basic_color(&mut img, 0.0, 1.0, 0.0);
        let d = img.data();
        assert_abs_diff_eq!(d[0], d[1], epsilon = 1e-6);
        assert_abs_diff_eq!(d[1], d[2], epsilon = 1e-6);
    }
}
