//! Shared render context.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::{Backend, ComputeBackend, CpuBackend, GpuLimits, create_backend};

/// Owns the active compute backend and is shared by every render.
///
/// Construction never fails. If the requested backend cannot be created the
/// context logs why and runs on the CPU, and every operation still works.
#[derive(Clone)]
pub struct RenderContext {
    backend: Arc<dyn ComputeBackend>,
}

impl RenderContext {
    /// Create a context for `backend`, falling back to the CPU.
    pub fn new(backend: Backend) -> Self {
        match create_backend(backend) {
            Ok(b) => {
                info!(requested = %backend, active = b.name(), "render context ready");
                Self { backend: Arc::from(b) }
            }
            Err(e) => {
                if backend == Backend::Cpu {
                    warn!(error = %e, "cpu backend failed to initialize");
                } else {
                    info!(requested = %backend, reason = %e, "GPU unavailable, using CPU fallback");
                }
                Self::cpu()
            }
        }
    }

    /// A context on the CPU backend.
    pub fn cpu() -> Self {
        Self { backend: Arc::new(CpuBackend::new()) }
    }

    /// Wrap an existing backend.
    pub fn with_backend(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn ComputeBackend {
        self.backend.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn limits(&self) -> &GpuLimits {
        self.backend.limits()
    }

    /// True when running on a GPU.
    pub fn is_accelerated(&self) -> bool {
        self.backend.name() != "cpu"
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(Backend::Auto)
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("backend", &self.backend.name())
            .field("limits", self.backend.limits())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_context() {
        let ctx = RenderContext::new(Backend::Cpu);
        assert_eq!(ctx.backend_name(), "cpu");
        assert!(!ctx.is_accelerated());
        assert_eq!(ctx.limits().max_texture_dim, 16384);
    }

    #[test]
    fn test_auto_always_yields_a_backend() {
        let ctx = RenderContext::new(Backend::Auto);
        assert!(["cpu", "wgpu"].contains(&ctx.backend_name()));
    }
}
