//! Device limits and what they allow.

/// GPU resource limits.
#[derive(Debug, Clone)]
pub struct GpuLimits {
    /// Maximum 2D texture dimension (width or height).
    pub max_texture_dim: u32,
    /// Maximum single buffer binding in bytes.
    pub max_buffer_bytes: u64,
    /// Available memory in bytes.
    pub available_memory: u64,
}

impl Default for GpuLimits {
    fn default() -> Self {
        Self {
            max_texture_dim: 16384,
            max_buffer_bytes: 256 * 1024 * 1024, // 256 MB
            available_memory: 2 * 1024 * 1024 * 1024, // 2 GB
        }
    }
}

impl GpuLimits {
    /// True if a `width` x `height` texture can be allocated.
    pub fn fits_texture(&self, width: u32, height: u32) -> bool {
        width > 0 && height > 0 && width <= self.max_texture_dim && height <= self.max_texture_dim
    }

    /// Rows of `width` RGBA f32 pixels that fit in one buffer binding.
    pub fn rows_per_band(&self, width: u32) -> u32 {
        let row_bytes = (width.max(1) as u64) * 16;
        (self.max_buffer_bytes / row_bytes).clamp(1, u32::MAX as u64) as u32
    }

    /// Upscale factors allowed by the texture ceiling.
    pub fn upscale_factors(&self, width: u32, height: u32) -> UpscaleFactors {
        UpscaleFactors::for_size(width, height, self.max_texture_dim)
    }
}

/// Which upscale factors keep the output within the texture ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpscaleFactors {
    pub can_scale_1_5x: bool,
    pub can_scale_2x: bool,
    pub can_scale_3x: bool,
}

impl UpscaleFactors {
    /// A factor is available iff `min(ceiling/width, ceiling/height) >= factor`.
    pub fn for_size(width: u32, height: u32, ceiling: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::default();
        }
        let ceiling = ceiling as f64;
        let max_factor = (ceiling / width as f64).min(ceiling / height as f64);
        Self {
            can_scale_1_5x: max_factor >= 1.5,
            can_scale_2x: max_factor >= 2.0,
            can_scale_3x: max_factor >= 3.0,
        }
    }
}
