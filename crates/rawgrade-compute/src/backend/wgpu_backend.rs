//! wgpu backend implementation.
//!
//! LUTs are uploaded once per identifier as `rgba16float` 3D textures and
//! sampled with hardware trilinear filtering. Submissions to the shared queue
//! are serialized so concurrent renders never interleave encoder work.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use half::f16;
use parking_lot::Mutex;
use tracing::{debug, info, trace};
use wgpu::util::DeviceExt;

use rawgrade_lut::Lut3D;

use super::{ComputeBackend, GpuLimits, TextureCache};
use crate::{ComputeError, ComputeResult, RasterImage, shaders};

// =============================================================================
// Uniform Buffers
// =============================================================================

/// LUT kernel parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct LutUniform {
    pixel_count: u32,
    dimension: u32,
    intensity: f32,
    _pad: u32,
}

/// Upscale kernel parameters for one output band.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct UpscaleUniform {
    src_dims: [u32; 2],
    dst_dims: [u32; 2],
    row_offset: u32,
    row_count: u32,
    _pad: [u32; 2],
}

/// Per-dimension dispatch ceiling.
const MAX_WORKGROUPS: u32 = 65535;
/// `@workgroup_size` of the LUT kernel.
const LUT_WORKGROUP: u32 = 256;
/// `@workgroup_size` (both axes) of the upscale kernel.
const UPSCALE_WORKGROUP: u32 = 16;
/// Bytes per RGBA f32 pixel.
const PIXEL_BYTES: u64 = 16;

struct Pipelines {
    lut3d: wgpu::ComputePipeline,
    upscale: wgpu::ComputePipeline,
}

/// A LUT lattice resident on the GPU.
struct LutTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// GPU backend.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: Pipelines,
    lut_sampler: wgpu::Sampler,
    lut_textures: TextureCache<LutTexture>,
    submit_lock: Mutex<()>,
    limits: GpuLimits,
    adapter_info: wgpu::AdapterInfo,
}

impl WgpuBackend {
    /// Check if wgpu is available.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Create a new backend on the default high-performance adapter.
    pub fn new() -> ComputeResult<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Create a new backend asynchronously.
    pub async fn new_async() -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("rawgrade_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            }, None)
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let adapter_info = adapter.get_info();
        let available_memory = estimate_vram(&adapter_info, adapter_limits.max_buffer_size);

        let limits = GpuLimits {
            max_texture_dim: adapter_limits.max_texture_dimension_2d,
            max_buffer_bytes: (adapter_limits.max_storage_buffer_binding_size as u64)
                .min(adapter_limits.max_buffer_size),
            available_memory,
        };

        let pipelines = Self::create_pipelines(&device);
        let lut_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lut_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            max_texture_dim = limits.max_texture_dim,
            vram_mb = available_memory >> 20,
            "wgpu backend ready"
        );

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            pipelines,
            lut_sampler,
            lut_textures: TextureCache::new(),
            submit_lock: Mutex::new(()),
            limits,
            adapter_info,
        })
    }

    fn create_pipelines(device: &wgpu::Device) -> Pipelines {
        let create_pipeline = |source: &str, label: &str| -> wgpu::ComputePipeline {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None, // Auto layout
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        Pipelines {
            lut3d: create_pipeline(shaders::LUT3D, "lut3d_pipeline"),
            upscale: create_pipeline(shaders::UPSCALE, "upscale_pipeline"),
        }
    }

    /// Resident texture for `lut`. LUTs without an identifier are uploaded
    /// for this call only.
    fn lut_texture(&self, lut: &Lut3D) -> ComputeResult<Arc<LutTexture>> {
        if lut.id().is_empty() {
            return Ok(Arc::new(self.create_lut_texture(lut)?));
        }
        self.lut_textures
            .get_or_try_insert_with(lut.id(), || self.create_lut_texture(lut))
    }

    fn create_lut_texture(&self, lut: &Lut3D) -> ComputeResult<LutTexture> {
        let dim = lut.dimension() as u32;
        debug!(id = lut.id(), dimension = dim, "uploading LUT texture");

        // Entry order is red fastest, blue slowest: x, y, z of the texture.
        let texels: Vec<f16> = lut.data().iter().map(|&v| f16::from_f32(v)).collect();
        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("lut3d_texture"),
                size: wgpu::Extent3d { width: dim, height: dim, depth_or_array_layers: dim },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D3,
                format: wgpu::TextureFormat::Rgba16Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(&texels),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(LutTexture { _texture: texture, view })
    }

    fn create_source_texture(&self, image: &RasterImage) -> wgpu::Texture {
        let texels: Vec<f16> = image.data().iter().map(|&v| f16::from_f32(v)).collect();
        self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("upscale_source"),
                size: wgpu::Extent3d { width: image.width(), height: image.height(), depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba16Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(&texels),
        )
    }

    fn create_uniform<T: Pod>(&self, label: &str, value: &T) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(value),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    fn create_output(&self, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("output_buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    /// Execute compute dispatch, copy `output` back and wait.
    fn dispatch_and_read(
        &self,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        workgroups: (u32, u32, u32),
        output: &wgpu::Buffer,
    ) -> ComputeResult<Vec<f32>> {
        let size = output.size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let _guard = self.submit_lock.lock();

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("compute_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, workgroups.2);
        }
        encoder.copy_buffer_to_buffer(output, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| { let _ = tx.send(r); });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("Map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("Map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();

        Ok(result)
    }

    /// Pixels per LUT dispatch: bounded by the binding size and the
    /// one-dimensional workgroup ceiling.
    fn lut_chunk_pixels(&self) -> usize {
        let by_buffer = self.limits.max_buffer_bytes / PIXEL_BYTES;
        let by_dispatch = (MAX_WORKGROUPS as u64) * (LUT_WORKGROUP as u64);
        by_buffer.min(by_dispatch).max(1) as usize
    }
}

impl ComputeBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn limits(&self) -> &GpuLimits {
        &self.limits
    }

    fn apply_lut3d(&self, image: &RasterImage, lut: &Lut3D, intensity: f32) -> ComputeResult<RasterImage> {
        let (w, h) = image.dimensions();
        let t = intensity.clamp(0.0, 1.0);
        let texture = self.lut_texture(lut)?;
        let layout = self.pipelines.lut3d.get_bind_group_layout(0);

        let chunk_len = self.lut_chunk_pixels() * RasterImage::CHANNELS;
        let mut out = Vec::with_capacity(image.data().len());

        for chunk in image.data().chunks(chunk_len) {
            let count = (chunk.len() / RasterImage::CHANNELS) as u32;
            trace!(pixels = count, dimension = lut.dimension(), intensity = t, "gpu lut3d chunk");

            let src = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lut_src"),
                contents: bytemuck::cast_slice(chunk),
                usage: wgpu::BufferUsages::STORAGE,
            });
            let dst = self.create_output(count as u64 * PIXEL_BYTES);
            let params = self.create_uniform("lut_params", &LutUniform {
                pixel_count: count,
                dimension: lut.dimension() as u32,
                intensity: t,
                _pad: 0,
            });

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lut3d_bind_group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: src.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: dst.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: params.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&texture.view) },
                    wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::Sampler(&self.lut_sampler) },
                ],
            });

            let workgroups = (count.div_ceil(LUT_WORKGROUP), 1, 1);
            out.extend(self.dispatch_and_read(&self.pipelines.lut3d, &bind_group, workgroups, &dst)?);
        }

        RasterImage::from_rgba(w, h, out)
    }

    fn upscale(&self, image: &RasterImage, width: u32, height: u32) -> ComputeResult<RasterImage> {
        if image.is_empty() || width == 0 || height == 0 {
            return Err(ComputeError::InvalidDimensions(width, height));
        }
        let limit = self.limits.max_texture_dim;
        if !self.limits.fits_texture(image.width(), image.height()) {
            return Err(ComputeError::ImageTooLarge { width: image.width(), height: image.height(), limit });
        }
        if !self.limits.fits_texture(width, height) {
            return Err(ComputeError::ImageTooLarge { width, height, limit });
        }

        let source = self.create_source_texture(image);
        let view = source.create_view(&wgpu::TextureViewDescriptor::default());
        let layout = self.pipelines.upscale.get_bind_group_layout(0);

        let band = self.limits
            .rows_per_band(width)
            .min(MAX_WORKGROUPS * UPSCALE_WORKGROUP);
        debug!(src_w = image.width(), src_h = image.height(), dst_w = width, dst_h = height, band, "gpu upscale");

        let mut out = Vec::with_capacity(width as usize * height as usize * RasterImage::CHANNELS);
        let mut row = 0;
        while row < height {
            let rows = band.min(height - row);
            let dst = self.create_output(width as u64 * rows as u64 * PIXEL_BYTES);
            let params = self.create_uniform("upscale_params", &UpscaleUniform {
                src_dims: [image.width(), image.height()],
                dst_dims: [width, height],
                row_offset: row,
                row_count: rows,
                _pad: [0; 2],
            });

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("upscale_bind_group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                    wgpu::BindGroupEntry { binding: 1, resource: dst.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: params.as_entire_binding() },
                ],
            });

            let workgroups = (width.div_ceil(UPSCALE_WORKGROUP), rows.div_ceil(UPSCALE_WORKGROUP), 1);
            out.extend(self.dispatch_and_read(&self.pipelines.upscale, &bind_group, workgroups, &dst)?);
            row += rows;
        }

        RasterImage::from_rgba(width, height, out)
    }
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter_info.name)
            .field("limits", &self.limits)
            .field("cached_luts", &self.lut_textures.len())
            .finish()
    }
}

/// Estimate usable VRAM from adapter type and buffer limits.
///
/// `RAWGRADE_GPU_MEMORY_MB` overrides the estimate.
fn estimate_vram(info: &wgpu::AdapterInfo, max_buffer_bytes: u64) -> u64 {
    if let Ok(mb) = std::env::var("RAWGRADE_GPU_MEMORY_MB") {
        if let Ok(mb) = mb.parse::<u64>() {
            return mb.saturating_mul(1024 * 1024);
        }
    }

    let from_buffer = max_buffer_bytes.saturating_mul(2);

    let estimated = match info.device_type {
        wgpu::DeviceType::DiscreteGpu => from_buffer.clamp(2u64 << 30, 24u64 << 30),
        wgpu::DeviceType::IntegratedGpu => from_buffer.clamp(512u64 << 20, 4u64 << 30),
        wgpu::DeviceType::VirtualGpu => from_buffer.clamp(1u64 << 30, 8u64 << 30),
        _ => from_buffer.clamp(256u64 << 20, 2u64 << 30),
    };

    // 80% safe margin
    estimated.saturating_mul(80) / 100
}
