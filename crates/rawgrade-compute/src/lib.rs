//! Compute backends for the rawgrade pipeline.
//!
//! Two GPU-shaped operations live here: sampling a 3D LUT with an intensity
//! blend, and spatial upscaling. Both run either on the GPU through wgpu or
//! on the CPU with rayon, behind the same [`ComputeBackend`] trait.
//!
//! # Architecture
//!
//! ```text
//! RenderContext ──► Arc<dyn ComputeBackend>
//!                        ├── CpuBackend   (rayon, reference results)
//!                        └── WgpuBackend  (compute shaders, LUT texture cache)
//! SpatialUpscaler ─┘
//! ```
//!
//! [`RenderContext::new`] never fails: when no adapter is found it logs the
//! reason and falls back to the CPU backend.
//!
//! # Example
//!
//! ```
//! use rawgrade_compute::{Backend, RasterImage, RenderContext, SpatialUpscaler};
//! use rawgrade_lut::Lut3D;
//!
//! let ctx = RenderContext::new(Backend::Cpu);
//! let img = RasterImage::from_rgba(1, 1, vec![0.2, 0.4, 0.6, 1.0]).unwrap();
//! let out = ctx.backend().apply_lut3d(&img, &Lut3D::identity(17), 1.0).unwrap();
//! assert!((out.data()[1] - 0.4).abs() < 1e-4);
//!
//! let up = SpatialUpscaler::new(&ctx).upscale(&img, 2.0).unwrap();
//! assert_eq!(up.dimensions(), (2, 2));
//! ```

pub mod backend;
pub mod image;
mod context;
mod upscale;
#[cfg(feature = "wgpu")]
mod shaders;

pub use backend::{
    Backend, BackendInfo, ComputeBackend, CpuBackend, GpuLimits, UpscaleFactors,
    create_backend, describe_backends, detect_backends, select_best_backend,
};
#[cfg(feature = "wgpu")]
pub use backend::WgpuBackend;
pub use context::RenderContext;
pub use image::RasterImage;
pub use upscale::{SpatialUpscaler, available_factors, upscaled_size};

use thiserror::Error;

/// Compute operation errors.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Image too large: {width}x{height} exceeds GPU limit {limit}")]
    ImageTooLarge { width: u32, height: u32, limit: u32 },

    #[error("Invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("GPU operation failed: {0}")]
    OperationFailed(String),
}

pub type ComputeResult<T> = Result<T, ComputeError>;
