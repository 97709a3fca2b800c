use cliprt_core::{HostBuffer, HostStream};

use crate::{STATUS_OUT_OF_RANGE, STATUS_SUCCESS};

#[inline]
fn clip_value(x: f32, lo: f32, hi: f32) -> f32 {
    // not f32::clamp: an inverted range must not panic
    x.max(lo).min(hi)
}

/// Enqueue the clamp of the first `count` elements of `input` into `output`.
pub(crate) fn enqueue_clip(
    stream: &HostStream,
    count:  usize,
    lo:     f32,
    hi:     f32,
    input:  &HostBuffer,
    output: &HostBuffer,
) -> i32 {
    if count > input.len() || count > output.len() {
        return STATUS_OUT_OF_RANGE;
    }

    let (input, output) = (input.clone(), output.clone());
    stream.enqueue(move || {
        if input.ptr_eq(&output) {
            for v in output.write()[..count].iter_mut() {
                *v = clip_value(*v, lo, hi);
            }
        } else {
            let src = input.read();
            let mut dst = output.write();
            for (d, &s) in dst[..count].iter_mut().zip(&src[..count]) {
                *d = clip_value(s, lo, hi);
            }
        }
    });
    STATUS_SUCCESS
}
