use std::{
    collections::HashMap,
    sync::Arc,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::types::{AbstractBindGroupLayout, AbstractComputePipeline};
use crate::GpuContext;

/// Signature of a compiled kernel: shader + binding counts
#[derive(Clone, PartialEq, Eq, Hash)]
struct KernelKey {
    src:   Arc<str>,
    ent:   Arc<str>,
    n_in:  usize,
    n_out: usize,
}

struct PipelineBundle {
    pipeline: Arc<AbstractComputePipeline>,
    layout:   Arc<AbstractBindGroupLayout>,
}

/// Per-context cache of compute pipelines and their layouts.
#[derive(Default)]
pub(crate) struct KernelCache {
    cache: Mutex<HashMap<KernelKey, Arc<PipelineBundle>>>,
}

impl KernelCache {
    pub(crate) fn get(
        &self,
        ctx: &GpuContext,
        src: &str,
        entry: &str,
        n_in: usize,
        n_out: usize,
    ) -> (Arc<AbstractComputePipeline>, Arc<AbstractBindGroupLayout>) {
        let key = KernelKey {
            src: Arc::from(src),
            ent: Arc::from(entry),
            n_in,
            n_out,
        };

        if let Some(b) = self.cache.lock().get(&key) {
            return (b.pipeline.clone(), b.layout.clone());
        }

        // compile outside the lock; a racing thread may compile the same key
        debug!(entry, n_in, n_out, "compiling compute pipeline");
        let layout   = ctx.create_storage_layout(n_in, n_out);
        let pipeline = ctx.create_compute_pipeline(src, entry, &layout);

        let bundle = self.cache.lock()
            .entry(key)
            .or_insert_with(|| Arc::new(PipelineBundle { pipeline, layout }))
            .clone();
        (bundle.pipeline.clone(), bundle.layout.clone())
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.lock().len()
    }
}
