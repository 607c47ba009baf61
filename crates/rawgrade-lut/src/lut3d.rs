//! 3D lattice data.

use crate::cube::MAX_DIMENSION;
use crate::{ParseError, ParseResult};

/// Immutable 3D LUT with RGBA lattice entries in `.cube` file order.
///
/// Entry `(r, g, b)` lives at `((b * size + g) * size + r) * 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    id: String,
    display_name: String,
    dimension: usize,
    data: Vec<f32>,
}

impl Lut3D {
    /// Creates a LUT from flattened RGBA data.
    ///
    /// `data.len()` must be `dimension^3 * 4`.
    pub fn from_rgba(dimension: usize, data: Vec<f32>) -> ParseResult<Self> {
        if dimension < 2 {
            return Err(ParseError::InvalidSize);
        }
        if dimension > MAX_DIMENSION {
            return Err(ParseError::UnsupportedSize(dimension));
        }
        let expected = dimension * dimension * dimension;
        if data.len() != expected * 4 {
            return Err(ParseError::DataMismatch { expected, actual: data.len() / 4 });
        }
        Ok(Self {
            id: String::new(),
            display_name: String::new(),
            dimension,
            data,
        })
    }

    /// Identity lattice of the given size (clamped to 2..=65).
    pub fn identity(dimension: usize) -> Self {
        Self::generate(dimension, |r, g, b| [r, g, b])
    }

    /// Builds a lattice by evaluating `transform` at every grid point.
    pub fn generate(dimension: usize, transform: impl Fn(f32, f32, f32) -> [f32; 3]) -> Self {
        let dimension = dimension.clamp(2, MAX_DIMENSION);
        Self {
            id: String::new(),
            display_name: String::new(),
            dimension,
            data: generate_cube_data(dimension, transform),
        }
    }

    /// Attaches the registry identity.
    pub fn with_name(mut self, id: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.id = id.into();
        self.display_name = display_name.into();
        self
    }

    /// Registry identifier (`bundle:...`, `import:...`), empty for anonymous LUTs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Lattice size along each axis.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Flattened RGBA data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of lattice points.
    pub fn entry_count(&self) -> usize {
        self.dimension * self.dimension * self.dimension
    }

    #[inline]
    fn texel(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        let d = self.dimension;
        let i = ((b * d + g) * d + r) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Trilinear lookup. Input is clamped to [0, 1] and mapped onto the
    /// lattice so that 0 and 1 hit the corner entries exactly.
    pub fn sample(&self, rgb: [f32; 3]) -> [f32; 3] {
        let n = (self.dimension - 1) as f32;
        let r = rgb[0].clamp(0.0, 1.0) * n;
        let g = rgb[1].clamp(0.0, 1.0) * n;
        let b = rgb[2].clamp(0.0, 1.0) * n;

        let ri = (r.floor() as usize).min(self.dimension - 2);
        let gi = (g.floor() as usize).min(self.dimension - 2);
        let bi = (b.floor() as usize).min(self.dimension - 2);

        let rf = r - ri as f32;
        let gf = g - gi as f32;
        let bf = b - bi as f32;

        let c000 = self.texel(ri, gi, bi);
        let c100 = self.texel(ri + 1, gi, bi);
        let c010 = self.texel(ri, gi + 1, bi);
        let c110 = self.texel(ri + 1, gi + 1, bi);
        let c001 = self.texel(ri, gi, bi + 1);
        let c101 = self.texel(ri + 1, gi, bi + 1);
        let c011 = self.texel(ri, gi + 1, bi + 1);
        let c111 = self.texel(ri + 1, gi + 1, bi + 1);

        let mut out = [0.0f32; 3];
        for i in 0..3 {
            let c00 = c000[i] + (c100[i] - c000[i]) * rf;
            let c10 = c010[i] + (c110[i] - c010[i]) * rf;
            let c01 = c001[i] + (c101[i] - c001[i]) * rf;
            let c11 = c011[i] + (c111[i] - c011[i]) * rf;

            let c0 = c00 + (c10 - c00) * gf;
            let c1 = c01 + (c11 - c01) * gf;

            out[i] = c0 + (c1 - c0) * bf;
        }
        out
    }
}

/// Generates RGBA lattice data in file order (B outer, G, R inner).
///
/// Output values are clamped to [0, 1]; alpha is 1.0.
pub fn generate_cube_data(dimension: usize, transform: impl Fn(f32, f32, f32) -> [f32; 3]) -> Vec<f32> {
    let max_index = (dimension.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(dimension * dimension * dimension * 4);

    for b in 0..dimension {
        let bf = b as f32 / max_index;
        for g in 0..dimension {
            let gf = g as f32 / max_index;
            for r in 0..dimension {
                let rf = r as f32 / max_index;
                let [or, og, ob] = transform(rf, gf, bf);
                data.extend_from_slice(&[or.clamp(0.0, 1.0), og.clamp(0.0, 1.0), ob.clamp(0.0, 1.0), 1.0]);
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identity_sample() {
        let lut = Lut3D::identity(17);
        for rgb in [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.25, 0.6, 0.9], [0.013, 0.5, 0.999]] {
            let out = lut.sample(rgb);
            for i in 0..3 {
                assert_abs_diff_eq!(out[i], rgb[i], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_sample_clamps_input() {
        let lut = Lut3D::identity(5);
        assert_eq!(lut.sample([-0.5, 2.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_file_order_r_fastest() {
        let data = generate_cube_data(2, |r, g, b| [r, g, b]);
        // Second entry is r=1, g=0, b=0
        assert_eq!(&data[4..8], &[1.0, 0.0, 0.0, 1.0]);
        // Third entry is r=0, g=1, b=0
        assert_eq!(&data[8..12], &[0.0, 1.0, 0.0, 1.0]);
        // Fifth entry is r=0, g=0, b=1
        assert_eq!(&data[16..20], &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_generate_clamps_output() {
        let lut = Lut3D::generate(3, |r, _, _| [r * 4.0, -1.0, 0.5]);
        assert!(lut.data().chunks(4).all(|t| t[0] <= 1.0 && t[1] == 0.0 && t[3] == 1.0));
    }

    #[test]
    fn test_from_rgba_validates_length() {
        let err = Lut3D::from_rgba(2, vec![0.0; 7 * 4]).unwrap_err();
        assert_eq!(err, ParseError::DataMismatch { expected: 8, actual: 7 });
        assert_eq!(Lut3D::from_rgba(1, vec![0.0; 4]).unwrap_err(), ParseError::InvalidSize);
    }
}
