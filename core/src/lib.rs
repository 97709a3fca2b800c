pub mod config;
pub mod stream;
pub mod types;
mod kernel_cache;

use anyhow::{anyhow, Context, Result};
use std::sync::{mpsc, Arc};
use tracing::info;
use wgpu::{
    util::DeviceExt, BindGroupLayoutDescriptor, BindGroupLayoutEntry, ShaderStages,
    CommandEncoder, CommandEncoderDescriptor, Device, Instance, PollType, ComputePipelineDescriptor,
    PipelineLayoutDescriptor, Queue, ShaderModule, ShaderModuleDescriptor, ShaderSource,
    PipelineCompilationOptions, BindGroup, BindGroupEntry, BindGroupDescriptor, ComputePassDescriptor,
};

pub use config::{DeviceConfig, PowerPreference};
pub use stream::{DeviceBuffer, DeviceKind, GpuStream, HostBuffer, HostStream, Stream};
pub use types::GpuBuffer;

use kernel_cache::KernelCache;
use types::{AbstractBuffer, AbstractBindGroupLayout, AbstractComputePipeline, BufferKind};

/// Context for GPU operations
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<Device>,
    pub queue:  Arc<Queue>,
    kernels:    Arc<KernelCache>,
    config:     Arc<DeviceConfig>,
}

impl GpuContext {
    /* ------------------------------------------------------------------ */
    /* Construction                                                       */
    /* ------------------------------------------------------------------ */
    pub async fn new() -> Result<Self> {
        Self::with_config(&DeviceConfig::default()).await
    }

    pub async fn with_config(config: &DeviceConfig) -> Result<Self> {
        config.validate()?;

        let instance = Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference.into(),
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|e| anyhow!("No suitable adapter found: {}", e))?;

        let adapter_info = adapter.get_info();
        info!(adapter = %adapter_info.name, backend = ?adapter_info.backend, "acquired GPU adapter");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(config.label.as_str()),
                ..Default::default()
            })
            .await?;

        Ok(Self {
            device:  Arc::new(device),
            queue:   Arc::new(queue),
            kernels: Arc::new(KernelCache::default()),
            config:  Arc::new(config.clone()),
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn workgroup_size(&self) -> u32 {
        self.config.workgroup_size
    }

    /// A new submission stream on this context's queue.
    pub fn stream(&self) -> GpuStream {
        GpuStream::new(self.clone())
    }

    /* ------------------------------------------------------------------ */
    /* Buffers                                                            */
    /* ------------------------------------------------------------------ */

    /// Allocate an uninitialised GPU buffer.
    pub fn create_buffer(&self, size: u64, usage: BufferKind) -> AbstractBuffer {
        AbstractBuffer(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage: usage.into(),
            mapped_at_creation: false,
        }))
    }

    /// Allocate and initialise a GPU buffer from host data.
    pub fn create_buffer_with_data(&self, data: &[u8], usage: BufferKind) -> AbstractBuffer {
        AbstractBuffer(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: None,
            contents: data,
            usage: usage.into(),
        }))
    }

    /// Zero-filled `f32` storage buffer with room for `len` elements.
    pub fn alloc_f32(&self, len: usize) -> GpuBuffer {
        // zero-sized bindings are invalid, keep at least one element
        let size = (len.max(1) * std::mem::size_of::<f32>()) as u64;
        GpuBuffer::new(self.create_buffer(size, BufferKind::Storage), len)
    }

    /// Upload host data into a new `f32` storage buffer.
    pub fn upload_f32(&self, data: &[f32]) -> GpuBuffer {
        if data.is_empty() {
            return self.alloc_f32(0);
        }
        let raw = self.create_buffer_with_data(bytemuck::cast_slice(data), BufferKind::Storage);
        GpuBuffer::new(raw, data.len())
    }

    /// Blocking read of a storage buffer through a MAP_READ staging copy.
    pub fn download_f32(&self, buffer: &GpuBuffer) -> Result<Vec<f32>> {
        if buffer.is_empty() {
            return Ok(Vec::new());
        }
        let size = buffer.size_bytes();
        let staging = self.create_buffer(size, BufferKind::Download);
        self.copy_buffer_to_buffer(buffer.as_raw(), &staging, size);

        let slice = staging.raw().slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.wait_idle()?;
        rx.recv().context("map callback dropped")??;

        let data = {
            let view = slice.get_mapped_range();
            bytemuck::pod_collect_to_vec::<u8, f32>(&view)
        };
        staging.raw().unmap();
        Ok(data)
    }

    /* ------------------------------------------------------------------ */
    /* Encoder helpers                                                    */
    /* ------------------------------------------------------------------ */
    fn create_encoder(&self, label: &str) -> CommandEncoder {
        self.device
            .create_command_encoder(&CommandEncoderDescriptor { label: Some(label) })
    }

    fn submit_encoder(&self, encoder: CommandEncoder) {
        self.queue.submit(Some(encoder.finish()));
    }

    pub fn copy_buffer_to_buffer(&self, src: &AbstractBuffer, dst: &AbstractBuffer, size: u64) {
        let mut enc = self.create_encoder("copy-b2b");
        enc.copy_buffer_to_buffer(src.raw(), 0, dst.raw(), 0, size);
        self.submit_encoder(enc);
    }

    /* ------------------------------------------------------------------ */
    /* Pipelines                                                          */
    /* ------------------------------------------------------------------ */

    /// Create a storage buffer layout for a compute shader.
    pub fn create_storage_layout(&self, n_in: usize, n_out: usize) -> Arc<AbstractBindGroupLayout> {
        let storage_entry = |binding: usize, read_only: bool| BindGroupLayoutEntry {
            binding: binding as u32,
            visibility: ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let entries: Vec<BindGroupLayoutEntry> = (0..n_in)
            .map(|i| storage_entry(i, true))
            .chain((0..n_out).map(|i| storage_entry(n_in + i, false)))
            .collect();

        let bgl = self.device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("storage-layout"),
            entries: &entries,
        });
        Arc::new(AbstractBindGroupLayout(bgl))
    }

    /// Create a compute pipeline from WGSL source code.
    pub fn create_compute_pipeline(
        &self,
        src: &str,
        entry: &str,
        layout: &AbstractBindGroupLayout,
    ) -> Arc<AbstractComputePipeline> {
        let module: ShaderModule = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some("wgsl-module"),
            source: ShaderSource::Wgsl(src.into()),
        });
        let pipeline_layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("compute-pl-layout"),
            bind_group_layouts: &[&layout.0],
            push_constant_ranges: &[],
        });
        let pipeline = self.device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: Some(entry),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(entry),
            compilation_options: PipelineCompilationOptions::default(),
            cache: None,
        });
        Arc::new(AbstractComputePipeline(pipeline))
    }

    /// Cached pipeline + layout for `entry` in `src` with `n_in` read-only
    /// and `n_out` read-write storage bindings.
    pub fn pipeline(
        &self,
        src: &str,
        entry: &str,
        n_in: usize,
        n_out: usize,
    ) -> (Arc<AbstractComputePipeline>, Arc<AbstractBindGroupLayout>) {
        self.kernels.get(self, src, entry, n_in, n_out)
    }

    pub fn cached_pipelines(&self) -> usize {
        self.kernels.len()
    }

    /* ------------------------------------------------------------------ */
    /* Dispatch                                                           */
    /* ------------------------------------------------------------------ */

    fn create_storage_bind_group(
        &self,
        layout: &AbstractBindGroupLayout,
        inputs: &[&AbstractBuffer],
        outputs: &[&AbstractBuffer],
    ) -> BindGroup {
        let entries: Vec<BindGroupEntry> = inputs
            .iter()
            .chain(outputs)
            .enumerate()
            .map(|(i, b)| BindGroupEntry {
                binding: i as u32,
                resource: b.0.as_entire_binding(),
            })
            .collect();
        self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("storage-bg"),
            layout: &layout.0,
            entries: &entries,
        })
    }

    /// Record and submit one compute pass. Returns without waiting.
    pub fn dispatch_compute(
        &self,
        pipeline: &AbstractComputePipeline,
        layout: &AbstractBindGroupLayout,
        inputs: &[&AbstractBuffer],
        outputs: &[&AbstractBuffer],
        groups: (u32, u32, u32),
    ) {
        let bg = self.create_storage_bind_group(layout, inputs, outputs);

        let mut enc = self.create_encoder("dispatch");
        {
            let mut pass = enc.begin_compute_pass(&ComputePassDescriptor::default());
            pass.set_pipeline(&pipeline.0);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(groups.0, groups.1, groups.2);
        }
        self.submit_encoder(enc);
    }

    /* ------------------------------------------------------------------ */
    /* Misc utils                                                         */
    /* ------------------------------------------------------------------ */

    /// Block until the queue is idle.
    pub fn wait_idle(&self) -> Result<()> {
        self.device.poll(PollType::Wait)?;
        Ok(())
    }

    /// Workgroup grid covering `total` threads: `(x, y, 1)` with `y > 1`
    /// only when `x` would exceed the per-dimension limit. `None` if even a
    /// 2-D grid cannot cover it.
    pub fn grid_for(&self, total: usize) -> Option<(u32, u32, u32)> {
        let max_dim = self.device.limits().max_compute_workgroups_per_dimension;
        grid_1d(total, self.workgroup_size(), max_dim)
    }
}

/// Helper: split `ceil(total / workgroup_size)` groups into a 2-D grid.
pub fn grid_1d(total: usize, workgroup_size: u32, max_dim: u32) -> Option<(u32, u32, u32)> {
    let wg = workgroup_size.max(1) as usize;
    let max_dim = max_dim.max(1) as usize;
    let groups = total.div_ceil(wg).max(1);
    let x = groups.min(max_dim);
    let y = groups.div_ceil(x);
    if y > max_dim {
        return None;
    }
    Some((x as u32, y as u32, 1))
}
