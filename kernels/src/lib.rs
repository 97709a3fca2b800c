//! Device kernels for the clip operator.
//!
//! A kernel enqueues `output[i] = min(max(input[i], lo), hi)` for the first
//! `count` elements on the given stream and returns an enqueue-time status.
//! Completion is observed through `Stream::synchronize`.

mod gpu;
mod host;

use cliprt_core::{DeviceBuffer, Stream};
use tracing::warn;

use gpu::GpuClip;

/// Work was enqueued
pub const STATUS_SUCCESS: i32 = 0;
/// Stream and buffers live on different devices
pub const STATUS_DEVICE_MISMATCH: i32 = 1;
/// `count` exceeds the length of a buffer
pub const STATUS_OUT_OF_RANGE: i32 = 2;
/// The device refused the launch
pub const STATUS_LAUNCH_FAILED: i32 = 3;

/// The clamp entry point an operator calls on every batch.
pub trait ClipKernel: Send + Sync {
    fn clip(
        &self,
        stream: &Stream,
        count:  usize,
        lo:     f32,
        hi:     f32,
        input:  &DeviceBuffer,
        output: &DeviceBuffer,
    ) -> i32;
}

impl<F> ClipKernel for F
where
    F: Fn(&Stream, usize, f32, f32, &DeviceBuffer, &DeviceBuffer) -> i32 + Send + Sync,
{
    fn clip(
        &self,
        stream: &Stream,
        count:  usize,
        lo:     f32,
        hi:     f32,
        input:  &DeviceBuffer,
        output: &DeviceBuffer,
    ) -> i32 {
        self(stream, count, lo, hi, input, output)
    }
}

/// Picks the host or WGSL implementation from the stream's device.
#[derive(Default)]
pub struct DefaultClipKernel {
    gpu: GpuClip,
}

impl DefaultClipKernel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipKernel for DefaultClipKernel {
    fn clip(
        &self,
        stream: &Stream,
        count:  usize,
        lo:     f32,
        hi:     f32,
        input:  &DeviceBuffer,
        output: &DeviceBuffer,
    ) -> i32 {
        match (stream, input, output) {
            (Stream::Host(s), DeviceBuffer::Host(i), DeviceBuffer::Host(o)) => {
                host::enqueue_clip(s, count, lo, hi, i, o)
            }
            (Stream::Gpu(s), DeviceBuffer::Gpu(i), DeviceBuffer::Gpu(o)) => {
                self.gpu.enqueue_clip(s, count, lo, hi, i, o)
            }
            _ => {
                warn!(
                    stream = ?stream.kind(),
                    input = ?input.kind(),
                    output = ?output.kind(),
                    "clip buffers are not on the stream's device"
                );
                STATUS_DEVICE_MISMATCH
            }
        }
    }
}
