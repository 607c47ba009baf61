//! # rawgrade-pipeline
//!
//! Turns a decoded raster and an [`AdjustmentSet`] into a graded image.
//!
//! ```text
//! RasterImage + AdjustmentSet
//!        │
//!        ▼
//! ColorPipeline ── needs_grading()? ── no ──► copy
//!        │ yes
//!        ▼
//! Exposure → Highlights/Shadows → White balance → Vibrance → Hue
//!   → Tone curve → Brightness/Contrast/Saturation → Sharpen
//!   → Noise reduction → LUT (registry + compute backend)
//!        │
//!        ▼
//! SpatialUpscaler (if enabled; refused → original size)
//! ```
//!
//! [`RenderSession`] wraps a pipeline for interactive use: one in-flight
//! render per image, last request wins.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rawgrade_compute::{RasterImage, RenderContext};
//! use rawgrade_lut::{GeneratedPresets, LutRegistry, MemoryPreferences};
//! use rawgrade_pipeline::{AdjustmentSet, ColorPipeline};
//!
//! let dir = std::env::temp_dir().join("rawgrade-doc-luts");
//! let registry = LutRegistry::new(dir, Box::new(MemoryPreferences::new()))
//!     .with_bundle(GeneratedPresets::builtin());
//! let pipeline = ColorPipeline::new(RenderContext::cpu(), Arc::new(registry));
//!
//! let img = RasterImage::from_rgba(1, 1, vec![0.25, 0.25, 0.25, 1.0]).unwrap();
//! let adj = AdjustmentSet { exposure: 1.0, ..Default::default() };
//! let out = pipeline.render(&img, &adj).unwrap();
//! assert!((out.data()[0] - 0.5).abs() < 1e-6);
//! ```

mod adjustments;
mod config;
mod error;
mod pipeline;
pub mod session;
pub mod stages;

pub use adjustments::{AdjustmentSet, DEFAULT_TEMPERATURE, LUT_EPSILON, NO_LUT, ToneCurve};
pub use config::{Config, ENV_BACKEND, ENV_BUNDLE_DIR, ENV_DATA_DIR};
pub use error::{RenderError, RenderResult};
pub use pipeline::ColorPipeline;
pub use session::{CancelToken, Debouncer, Generation, RenderSession};
pub use stages::Stage;
