//! White balance, vibrance and hue rotation.

use glam::{Mat3, Vec3};

use rawgrade_compute::RasterImage;

use super::{LUMA, luma, map_rgb};
use crate::AdjustmentSet;

/// RGB multipliers that neutralize light of color temperature `kelvin`,
/// normalized to green = 1.
///
/// Polynomial fit of the Planckian locus (Tanner Helland), valid for
/// 1000 K to 40000 K.
#[allow(clippy::excessive_precision)]
pub fn kelvin_to_rgb_multipliers(kelvin: f32) -> Vec3 {
    let temp = (kelvin / 100.0).clamp(10.0, 400.0);

    let (r, g, b) = if temp <= 66.0 {
        let g = 99.4708025861 * temp.ln() - 161.1195681661;
        let b = if temp <= 19.0 {
            0.0
        } else {
            138.5177312231 * (temp - 10.0).ln() - 305.0447927307
        };
        (255.0, g.clamp(0.0, 255.0), b.clamp(0.0, 255.0))
    } else {
        let r = 329.698727446 * (temp - 60.0).powf(-0.1332047592);
        let g = 288.1221695283 * (temp - 60.0).powf(-0.0755148492);
        (r.clamp(0.0, 255.0), g.clamp(0.0, 255.0), 255.0)
    };

    let light = Vec3::new(r, g, b) / 255.0;
    let g_ref = light.y.max(0.001);
    Vec3::new(g_ref / light.x.max(0.001), 1.0, g_ref / light.z.max(0.001))
}

/// Per-channel gains moving the `(reference, reference_tint)` neutral to the
/// `(temperature, tint)` target. Identity when they are equal.
pub fn white_balance_gains(adj: &AdjustmentSet) -> Vec3 {
    let target = kelvin_to_rgb_multipliers(adj.temperature);
    let reference = kelvin_to_rgb_multipliers(adj.reference_temperature);
    let mut gains = target / reference;
    gains.y *= (1.0 + adj.tint / 200.0) / (1.0 + adj.reference_tint / 200.0);
    gains
}

pub(super) fn white_balance(image: &mut RasterImage, adj: &AdjustmentSet) {
    let gains = white_balance_gains(adj);
    map_rgb(image, |rgb| (Vec3::from_array(rgb) * gains).to_array());
}

/// Saturation boost weighted by how muted the pixel already is.
pub(super) fn vibrance(image: &mut RasterImage, amount: f32) {
    map_rgb(image, |rgb| {
        let max = rgb[0].max(rgb[1]).max(rgb[2]);
        let min = rgb[0].min(rgb[1]).min(rgb[2]);
        let sat = (max - min).clamp(0.0, 1.0);
        let scale = 1.0 + amount * (1.0 - sat);
        let l = luma(rgb);
        rgb.map(|v| l + (v - l) * scale)
    });
}

/// Rotation about the luma axis by `degrees`.
pub fn hue_rotation(degrees: f32) -> Mat3 {
    let (s, c) = degrees.to_radians().sin_cos();
    let [lr, lg, lb] = LUMA;

    // Rows of the matrix, transposed into glam's column order below.
    Mat3::from_cols_array(&[
        lr + c * (1.0 - lr) - s * lr,
        lg - c * lg - s * lg,
        lb - c * lb + s * (1.0 - lb),
        lr - c * lr + s * 0.143,
        lg + c * (1.0 - lg) + s * 0.140,
        lb - c * lb - s * 0.283,
        lr - c * lr - s * (1.0 - lr),
        lg - c * lg + s * lg,
        lb + c * (1.0 - lb) + s * lb,
    ])
    .transpose()
}

pub(super) fn hue(image: &mut RasterImage, degrees: f32) {
    let m = hue_rotation(degrees);
    map_rgb(image, |rgb| (m * Vec3::from_array(rgb)).to_array());
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gains_identity_at_reference() {
        let adj = AdjustmentSet::with_reference(4200.0, 12.0);
        let g = white_balance_gains(&adj);
        assert_abs_diff_eq!(g.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(g.y, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(g.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_warmer_target_boosts_red() {
        let adj = AdjustmentSet { temperature: 9000.0, ..Default::default() };
        let g = white_balance_gains(&adj);
        assert!(g.x > 1.0);
        assert!(g.z < 1.0);
    }

    #[test]
    fn test_positive_tint_boosts_green() {
        let adj = AdjustmentSet { tint: 50.0, ..Default::default() };
        assert_abs_diff_eq!(white_balance_gains(&adj).y, 1.25, epsilon = 1e-6);
    }

    #[test]
    fn test_hue_zero_is_identity() {
        let m = hue_rotation(0.0);
        assert!(m.abs_diff_eq(Mat3::IDENTITY, 1e-6));
    }

    #[test]
    fn test_hue_keeps_greys() {
        let m = hue_rotation(120.0);
        let grey = m * Vec3::splat(0.4);
        assert_abs_diff_eq!(grey.x, 0.4, epsilon = 1e-3);
        assert_abs_diff_eq!(grey.y, 0.4, epsilon = 1e-3);
        assert_abs_diff_eq!(grey.z, 0.4, epsilon = 1e-3);
    }

    #[test]
    fn test_vibrance_moves_muted_more() {
        let mut img = RasterImage::from_rgba(2, 1, vec![
            0.5, 0.45, 0.4, 1.0, // muted
            1.0, 0.0, 0.0, 1.0,  // saturated
        ]).unwrap();
        vibrance(&mut img, 1.0);
        let d = img.data();
        let muted_spread = d[0] - d[2];
        assert!(muted_spread > 0.1 * 1.5);
        // Fully saturated red is untouched
        assert_abs_diff_eq!(d[4], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(d[5], 0.0, epsilon = 1e-6);
    }
}
