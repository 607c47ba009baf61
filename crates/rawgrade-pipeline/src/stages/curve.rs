//! Five-point tone curve baked into a lookup table.

use rawgrade_compute::RasterImage;

use super::map_rgb;
use crate::ToneCurve;

/// Lookup entries over x in [0, 1].
pub const TABLE_SIZE: usize = 4096;

/// Monotone cubic (Fritsch-Carlson) interpolant through the curve points,
/// sampled at [`TABLE_SIZE`] evenly spaced x positions.
#[derive(Debug, Clone)]
pub struct CurveTable {
    table: Vec<f32>,
}

impl CurveTable {
    pub fn new(curve: &ToneCurve) -> Self {
        let xs = ToneCurve::XS;
        let ys = curve.ys();
        let tangents = monotone_tangents(&xs, &ys);

        let table = (0..TABLE_SIZE)
            .map(|i| {
                let x = i as f32 / (TABLE_SIZE - 1) as f32;
                hermite(&xs, &ys, &tangents, x)
            })
            .collect();
        Self { table }
    }

    /// Curve value at `x`. Values outside [0, 1] are offset from the
    /// nearest endpoint so overbright data is not flattened.
    pub fn eval(&self, x: f32) -> f32 {
        let inside = x.clamp(0.0, 1.0);
        let pos = inside * (TABLE_SIZE - 1) as f32;
        let i = (pos as usize).min(TABLE_SIZE - 2);
        let f = pos - i as f32;
        let y = self.table[i] + (self.table[i + 1] - self.table[i]) * f;
        y + (x - inside)
    }
}

fn monotone_tangents(xs: &[f32; 5], ys: &[f32; 5]) -> [f32; 5] {
    let mut secants = [0.0f32; 4];
    for k in 0..4 {
        secants[k] = (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]);
    }

    let mut m = [0.0f32; 5];
    m[0] = secants[0];
    m[4] = secants[3];
    for k in 1..4 {
        m[k] = if secants[k - 1] * secants[k] <= 0.0 {
            0.0
        } else {
            (secants[k - 1] + secants[k]) * 0.5
        };
    }

    // Limit tangents so each segment stays monotone
    for k in 0..4 {
        if secants[k] == 0.0 {
            m[k] = 0.0;
            m[k + 1] = 0.0;
            continue;
        }
        let a = m[k] / secants[k];
        let b = m[k + 1] / secants[k];
        let h = a * a + b * b;
        if h > 9.0 {
            let t = 3.0 / h.sqrt();
            m[k] = t * a * secants[k];
            m[k + 1] = t * b * secants[k];
        }
    }
    m
}

fn hermite(xs: &[f32; 5], ys: &[f32; 5], m: &[f32; 5], x: f32) -> f32 {
    let k = xs.iter().rposition(|&x0| x0 <= x).unwrap_or(0).min(3);
    let h = xs[k + 1] - xs[k];
    let t = (x - xs[k]) / h;
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * ys[k] + h10 * h * m[k] + h01 * ys[k + 1] + h11 * h * m[k + 1]
}

pub(super) fn apply(image: &mut RasterImage, curve: &ToneCurve) {
    let table = CurveTable::new(curve);
    map_rgb(image, |rgb| rgb.map(|v| table.eval(v)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identity_curve() {
        let table = CurveTable::new(&ToneCurve::default());
        for x in [0.0, 0.1, 0.33, 0.5, 0.9, 1.0] {
            assert_abs_diff_eq!(table.eval(x), x, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_passes_through_points() {
        let curve = ToneCurve { blacks: 0.1, shadows: 0.2, mids: 0.6, highlights: 0.8, whites: 0.95 };
        let table = CurveTable::new(&curve);
        for (x, y) in ToneCurve::XS.iter().zip(curve.ys()) {
            assert_abs_diff_eq!(table.eval(*x), y, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_monotone_for_increasing_points() {
        let curve = ToneCurve { blacks: 0.0, shadows: 0.05, mids: 0.7, highlights: 0.72, whites: 1.0 };
        let table = CurveTable::new(&curve);
        let mut prev = table.eval(0.0);
        for i in 1..=200 {
            let y = table.eval(i as f32 / 200.0);
            assert!(y >= prev - 1e-6, "curve decreased at {}", i);
            prev = y;
        }
    }

    #[test]
    fn test_overbright_offsets() {
        let table = CurveTable::new(&ToneCurve::default());
        assert_abs_diff_eq!(table.eval(1.5), 1.5, epsilon = 1e-4);
        assert_abs_diff_eq!(table.eval(-0.2), -0.2, epsilon = 1e-4);
    }
}
