//! Compute backends with automatic selection.
//!
//! Provides a CPU (rayon) backend and an optional wgpu backend.

mod cpu_backend;
mod detect;
mod limits;
mod texture_cache;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::CpuBackend;
pub use detect::{BackendInfo, describe_backends, detect_backends, select_best_backend};
pub use limits::{GpuLimits, UpscaleFactors};
pub use texture_cache::TextureCache;

#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuBackend;

use std::fmt;
use std::str::FromStr;

use rawgrade_lut::Lut3D;

use crate::{ComputeError, ComputeResult, RasterImage};

/// Available compute backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Auto-select best available (wgpu > CPU).
    #[default]
    Auto,
    /// CPU backend using rayon for parallelization.
    Cpu,
    /// wgpu backend (Vulkan/Metal/DX12).
    Wgpu,
}

impl Backend {
    /// Check if this backend is available on current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Cpu => true,
            #[cfg(feature = "wgpu")]
            Self::Wgpu => WgpuBackend::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::Wgpu => false,
        }
    }

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Wgpu => "wgpu",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "wgpu" | "gpu" => Ok(Self::Wgpu),
            other => Err(ComputeError::BackendNotAvailable(other.to_string())),
        }
    }
}

/// The two GPU-shaped operations of the pipeline.
///
/// Implementations must produce functionally equivalent results; the CPU
/// backend is the reference.
pub trait ComputeBackend: Send + Sync {
    /// Backend name.
    fn name(&self) -> &'static str;

    /// Texture and memory limits.
    fn limits(&self) -> &GpuLimits;

    /// Samples `lut` at every pixel and blends with the input by `intensity`
    /// (clamped to [0, 1]). Alpha is passed through.
    fn apply_lut3d(&self, image: &RasterImage, lut: &Lut3D, intensity: f32) -> ComputeResult<RasterImage>;

    /// Resamples `image` to `width` x `height` with the spatial upscale filter.
    fn upscale(&self, image: &RasterImage, width: u32, height: u32) -> ComputeResult<RasterImage>;
}

/// Create a backend instance.
pub fn create_backend(backend: Backend) -> ComputeResult<Box<dyn ComputeBackend>> {
    match backend {
        Backend::Auto => {
            let best = select_best_backend();
            create_backend(best)
        }
        Backend::Cpu => Ok(Box::new(CpuBackend::new())),
        Backend::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                Ok(Box::new(WgpuBackend::new()?))
            }
            #[cfg(not(feature = "wgpu"))]
            {
                Err(ComputeError::BackendNotAvailable(
                    "wgpu feature not enabled".to_string()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("CPU".parse::<Backend>().unwrap(), Backend::Cpu);
        assert_eq!("gpu".parse::<Backend>().unwrap(), Backend::Wgpu);
        assert_eq!(" auto ".parse::<Backend>().unwrap(), Backend::Auto);
        assert!("cuda".parse::<Backend>().is_err());
    }

    #[test]
    fn test_cpu_always_available() {
        assert!(Backend::Cpu.is_available());
        assert_eq!(create_backend(Backend::Cpu).unwrap().name(), "cpu");
    }
}
