use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use cliprt_core::types::BufferKind;
use cliprt_core::{GpuBuffer, GpuStream};
use minijinja::{context, Environment};
use parking_lot::Mutex;
use tracing::warn;

use crate::{STATUS_LAUNCH_FAILED, STATUS_OUT_OF_RANGE, STATUS_SUCCESS};

const CLIP_WGSL: &str = include_str!("clip.wgsl");
const ENTRY: &str = "clip_kernel";

/// Matches `ClipParams` in clip.wgsl
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct ClipParams {
    lo:         f32,
    hi:         f32,
    count:      u32,
    row_stride: u32,
}

/// WGSL clamp kernel. Sources are rendered once per workgroup size; the
/// compiled pipelines live in each context's cache.
#[derive(Default)]
pub(crate) struct GpuClip {
    shaders: Mutex<HashMap<u32, Arc<str>>>,
}

impl GpuClip {
    fn shader(&self, workgroup_size: u32) -> Result<Arc<str>> {
        if let Some(src) = self.shaders.lock().get(&workgroup_size) {
            return Ok(src.clone());
        }
        let env = Environment::new();
        let rendered = env
            .template_from_str(CLIP_WGSL)?
            .render(context! { workgroup_size => workgroup_size })?;
        let src: Arc<str> = Arc::from(rendered);
        self.shaders.lock().insert(workgroup_size, src.clone());
        Ok(src)
    }

    pub(crate) fn enqueue_clip(
        &self,
        stream: &GpuStream,
        count:  usize,
        lo:     f32,
        hi:     f32,
        input:  &GpuBuffer,
        output: &GpuBuffer,
    ) -> i32 {
        if count > input.len() || count > output.len() {
            return STATUS_OUT_OF_RANGE;
        }
        if count == 0 {
            return STATUS_SUCCESS;
        }

        let ctx = stream.context();
        let (Some(groups), Ok(count)) = (ctx.grid_for(count), u32::try_from(count)) else {
            warn!(count, "clip launch does not fit the dispatch grid");
            return STATUS_LAUNCH_FAILED;
        };
        let src = match self.shader(ctx.workgroup_size()) {
            Ok(src) => src,
            Err(e) => {
                warn!(error = %e, "failed to render clip shader");
                return STATUS_LAUNCH_FAILED;
            }
        };

        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let (pipeline, layout) = ctx.pipeline(&src, ENTRY, 2, 1);
        let params = ClipParams { lo, hi, count, row_stride: groups.0 * ctx.workgroup_size() };
        let params_buf = ctx.create_buffer_with_data(bytemuck::bytes_of(&params), BufferKind::Params);

        // a buffer cannot be bound read-only and read-write in one pass
        let scratch;
        let x = if input.ptr_eq(output) {
            scratch = ctx.create_buffer(input.as_raw().size(), BufferKind::Storage);
            ctx.copy_buffer_to_buffer(input.as_raw(), &scratch, input.as_raw().size());
            &scratch
        } else {
            input.as_raw()
        };

        ctx.dispatch_compute(&pipeline, &layout, &[x, &params_buf], &[output.as_raw()], groups);

        // native backends validate eagerly; anything still pending is left
        // for the stream to resolve on synchronize
        let mut scope = Box::pin(ctx.device.pop_error_scope());
        match scope.as_mut().poll(&mut Context::from_waker(Waker::noop())) {
            Poll::Ready(None) => STATUS_SUCCESS,
            Poll::Ready(Some(e)) => {
                warn!(error = %e, "clip kernel launch rejected by device");
                STATUS_LAUNCH_FAILED
            }
            Poll::Pending => {
                stream.defer_check(move || match pollster::block_on(scope) {
                    None => Ok(()),
                    Some(e) => Err(anyhow::anyhow!("clip kernel launch rejected by device: {e}")),
                });
                STATUS_SUCCESS
            }
        }
    }
}
