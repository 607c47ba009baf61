//! The fixed, ordered list of pipeline stages.
//!
//! Every stage except [`Stage::Lut`] is a pure CPU transform over the RGB
//! channels; alpha is never touched. Each one is skipped on its own when its
//! parameters are at default.
//!
//! | # | Stage | Active when |
//! |---|-------|-------------|
//! | 1 | Exposure | `exposure != 0` |
//! | 2 | HighlightsShadows | `highlights != 1` or `shadows != 0` |
//! | 3 | WhiteBalance | target white point differs from reference |
//! | 4 | Vibrance | `vibrance != 0` |
//! | 5 | Hue | `hue != 0` |
//! | 6 | ToneCurve | curve is not the diagonal |
//! | 7 | BasicColor | brightness, contrast or saturation changed |
//! | 8 | Sharpen | `sharpness > 0` |
//! | 9 | NoiseReduction | enabled |
//! | 10 | Lut | enabled, id not `none`, intensity > 1e-4 |

mod color;
mod curve;
mod detail;
mod tone;

pub use color::{hue_rotation, kelvin_to_rgb_multipliers, white_balance_gains};
pub use curve::CurveTable;

use std::fmt;

use rayon::prelude::*;

use rawgrade_compute::RasterImage;

use crate::AdjustmentSet;

/// Rec.709 luma weights.
pub const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Exposure,
    HighlightsShadows,
    WhiteBalance,
    Vibrance,
    Hue,
    ToneCurve,
    BasicColor,
    Sharpen,
    NoiseReduction,
    Lut,
}

impl Stage {
    /// Execution order.
    pub const ORDER: [Stage; 10] = [
        Stage::Exposure,
        Stage::HighlightsShadows,
        Stage::WhiteBalance,
        Stage::Vibrance,
        Stage::Hue,
        Stage::ToneCurve,
        Stage::BasicColor,
        Stage::Sharpen,
        Stage::NoiseReduction,
        Stage::Lut,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Exposure => "exposure",
            Stage::HighlightsShadows => "highlights_shadows",
            Stage::WhiteBalance => "white_balance",
            Stage::Vibrance => "vibrance",
            Stage::Hue => "hue",
            Stage::ToneCurve => "tone_curve",
            Stage::BasicColor => "basic_color",
            Stage::Sharpen => "sharpen",
            Stage::NoiseReduction => "noise_reduction",
            Stage::Lut => "lut",
        }
    }

    /// Whether this stage has work to do for `adj`.
    pub fn is_active(&self, adj: &AdjustmentSet) -> bool {
        match self {
            Stage::Exposure => adj.exposure != 0.0,
            Stage::HighlightsShadows => adj.highlights != 1.0 || adj.shadows != 0.0,
            Stage::WhiteBalance => adj.white_balance_changed(),
            Stage::Vibrance => adj.vibrance != 0.0,
            Stage::Hue => adj.hue != 0.0,
            Stage::ToneCurve => !adj.tone_curve.is_identity(),
            Stage::BasicColor => adj.brightness != 0.0 || adj.contrast != 1.0 || adj.saturation != 1.0,
            Stage::Sharpen => adj.sharpness > 0.0,
            Stage::NoiseReduction => adj.noise_reduction_enabled,
            Stage::Lut => adj.lut_active(),
        }
    }

    /// Active stages for `adj`, in execution order.
    pub fn plan(adj: &AdjustmentSet) -> Vec<Stage> {
        Self::ORDER.iter().copied().filter(|s| s.is_active(adj)).collect()
    }

    /// Run a CPU stage in place. Returns false for [`Stage::Lut`], which
    /// needs the registry and a compute backend.
    pub fn apply_cpu(&self, image: &mut RasterImage, adj: &AdjustmentSet) -> bool {
        match self {
            Stage::Exposure => tone::exposure(image, adj.exposure),
            Stage::HighlightsShadows => tone::highlights_shadows(image, adj.highlights, adj.shadows),
            Stage::WhiteBalance => color::white_balance(image, adj),
            Stage::Vibrance => color::vibrance(image, adj.vibrance),
            Stage::Hue => color::hue(image, adj.hue),
            Stage::ToneCurve => curve::apply(image, &adj.tone_curve),
            Stage::BasicColor => tone::basic_color(image, adj.brightness, adj.contrast, adj.saturation),
            Stage::Sharpen => detail::sharpen(image, adj.sharpness),
            Stage::NoiseReduction => detail::noise_reduction(image, adj.noise_level, adj.noise_sharpness),
            Stage::Lut => return false,
        }
        true
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
pub(crate) fn luma(rgb: [f32; 3]) -> f32 {
    LUMA[0] * rgb[0] + LUMA[1] * rgb[1] + LUMA[2] * rgb[2]
}

#[inline]
pub(crate) fn smoothstep(lo: f32, hi: f32, x: f32) -> f32 {
    let t = ((x - lo) / (hi - lo)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Applies `f` to the RGB of every pixel in parallel.
pub(crate) fn map_rgb(image: &mut RasterImage, f: impl Fn([f32; 3]) -> [f32; 3] + Sync) {
    image
        .data_mut()
        .par_chunks_mut(RasterImage::CHANNELS)
        .for_each(|px| {
            let out = f([px[0], px[1], px[2]]);
            px[..3].copy_from_slice(&out);
        });
}
