//! CPU-side RGBA float raster.

use crate::{ComputeError, ComputeResult};

/// Interleaved RGBA `f32` image. Color values are nominally [0, 1] but are
/// not clamped; alpha is carried through every operation untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterImage {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl RasterImage {
    /// Channels per pixel.
    pub const CHANNELS: usize = 4;

    /// Black, opaque image.
    pub fn new(width: u32, height: u32) -> Self {
        let mut data = vec![0.0; width as usize * height as usize * Self::CHANNELS];
        for px in data.chunks_exact_mut(Self::CHANNELS) {
            px[3] = 1.0;
        }
        Self { data, width, height }
    }

    /// Wraps RGBA data. Length must be `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<f32>) -> ComputeResult<Self> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if data.len() != expected {
            return Err(ComputeError::BufferSizeMismatch { expected, actual: data.len() });
        }
        Ok(Self { data, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// RGBA at `(x, y)`, edge-clamped.
    #[inline]
    pub fn pixel_clamped(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let i = (y * self.width as usize + x) * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_check() {
        assert!(RasterImage::from_rgba(2, 2, vec![0.0; 16]).is_ok());
        let err = RasterImage::from_rgba(2, 2, vec![0.0; 15]).unwrap_err();
        assert!(matches!(err, ComputeError::BufferSizeMismatch { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_pixel_clamped() {
        let img = RasterImage::from_rgba(2, 1, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(img.pixel_clamped(-3, 0)[0], 0.0);
        assert_eq!(img.pixel_clamped(7, 9)[0], 1.0);
    }
}
