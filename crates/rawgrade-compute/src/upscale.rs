//! Spatial upscaler bounded by the backend's texture ceiling.

use tracing::{debug, warn};

use crate::backend::UpscaleFactors;
use crate::{RasterImage, RenderContext};

/// Upscale factors that keep `width` x `height` within `ceiling`.
pub fn available_factors(width: u32, height: u32, ceiling: u32) -> UpscaleFactors {
    UpscaleFactors::for_size(width, height, ceiling)
}

/// Output size for `factor`, truncated toward zero.
pub fn upscaled_size(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let w = (width as f64 * factor as f64).floor() as u32;
    let h = (height as f64 * factor as f64).floor() as u32;
    (w, h)
}

/// Enlarges images on the context's backend.
#[derive(Debug, Clone)]
pub struct SpatialUpscaler {
    context: RenderContext,
}

impl SpatialUpscaler {
    pub fn new(context: &RenderContext) -> Self {
        Self { context: context.clone() }
    }

    /// Factors the current backend can produce for this size.
    pub fn available_factors(&self, width: u32, height: u32) -> UpscaleFactors {
        self.context.limits().upscale_factors(width, height)
    }

    /// Upscale `image` by `factor`.
    ///
    /// Returns `None` when the image is empty, the output would exceed the
    /// texture ceiling, or the backend fails. Failures are logged.
    pub fn upscale(&self, image: &RasterImage, factor: f32) -> Option<RasterImage> {
        if image.is_empty() {
            debug!("upscale skipped: empty image");
            return None;
        }
        if !factor.is_finite() || factor < 1.0 {
            debug!(factor, "upscale skipped: invalid factor");
            return None;
        }

        let (sw, sh) = image.dimensions();
        let ceiling = self.context.limits().max_texture_dim as f64;
        let max_factor = (ceiling / sw as f64).min(ceiling / sh as f64);
        if (factor as f64) > max_factor {
            debug!(factor, max_factor, width = sw, height = sh, "upscale refused: exceeds texture ceiling");
            return None;
        }

        let (dw, dh) = upscaled_size(sw, sh, factor);
        match self.context.backend().upscale(image, dw, dh) {
            Ok(out) => Some(out),
            Err(e) => {
                warn!(backend = self.context.backend_name(), error = %e, "upscale failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upscaled_size_floors() {
        assert_eq!(upscaled_size(3, 5, 1.5), (4, 7));
        assert_eq!(upscaled_size(100, 50, 2.0), (200, 100));
        assert_eq!(upscaled_size(7, 7, 3.0), (21, 21));
    }

    #[test]
    fn test_refuses_empty_and_oversized() {
        let up = SpatialUpscaler::new(&RenderContext::cpu());
        assert!(up.upscale(&RasterImage::default(), 2.0).is_none());

        let wide = RasterImage::new(6000, 1);
        assert!(up.upscale(&wide, 3.0).is_none());
        assert!(up.available_factors(6000, 1).can_scale_2x);
    }
}
