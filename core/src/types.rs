use std::sync::Arc;
use wgpu::{Buffer, BufferUsages, BindGroupLayout, ComputePipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Tensor data bound as a storage buffer
    Storage,
    /// Small read-only kernel arguments
    Params,
    /// MAP_READ staging for device → host copies
    Download,
}
impl From<BufferKind> for BufferUsages {
    fn from(kind: BufferKind) -> Self {
        match kind {
            BufferKind::Storage => BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST,
            BufferKind::Params => BufferUsages::STORAGE | BufferUsages::COPY_DST,
            BufferKind::Download => BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        }
    }
}

#[derive(Debug)]
pub struct AbstractBuffer(pub(crate) Buffer);
impl AbstractBuffer {
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.0
    }

    pub fn size(&self) -> u64 {
        self.0.size()
    }
}

#[derive(Debug)]
pub struct AbstractBindGroupLayout(pub(crate) BindGroupLayout);

#[derive(Debug)]
pub struct AbstractComputePipeline(pub(crate) ComputePipeline);

/// Shared handle to an `f32` storage buffer living on the GPU
#[derive(Debug, Clone)]
pub struct GpuBuffer {
    inner: Arc<AbstractBuffer>,
    len:   usize,
}
impl GpuBuffer {
    pub(crate) fn new(inner: AbstractBuffer, len: usize) -> Self {
        GpuBuffer { inner: Arc::new(inner), len }
    }
    pub fn as_raw(&self) -> &AbstractBuffer { &self.inner }

    /// Capacity in `f32` elements (the allocation may be padded)
    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn size_bytes(&self) -> u64 { (self.len * std::mem::size_of::<f32>()) as u64 }

    /// True when both handles refer to the same device allocation
    pub fn ptr_eq(&self, other: &GpuBuffer) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}
