use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use derive_more::From;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use crate::types::GpuBuffer;
use crate::GpuContext;

/// Which device a stream or buffer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Host,
    Gpu,
}

/* ------------------------------------------------------------------------- */
/* Buffers                                                                   */
/* ------------------------------------------------------------------------- */

/// Host-resident `f32` buffer. Cloning shares the allocation; the length is
/// fixed at creation.
#[derive(Debug, Clone)]
pub struct HostBuffer(Arc<RwLock<Vec<f32>>>);

impl HostBuffer {
    pub fn from_vec(data: Vec<f32>) -> Self {
        HostBuffer(Arc::new(RwLock::new(data)))
    }

    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.0.read()
    }

    /// Mutable view of the elements; the slice cannot grow or shrink.
    pub fn write(&self) -> parking_lot::MappedRwLockWriteGuard<'_, [f32]> {
        RwLockWriteGuard::map(self.0.write(), |v| v.as_mut_slice())
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &HostBuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A device buffer handed to a kernel. Borrowed by kernels for the duration
/// of a call; enqueued work keeps its own clone of the handle.
#[derive(Debug, Clone, From)]
pub enum DeviceBuffer {
    Host(HostBuffer),
    Gpu(GpuBuffer),
}

impl DeviceBuffer {
    pub fn kind(&self) -> DeviceKind {
        match self {
            DeviceBuffer::Host(_) => DeviceKind::Host,
            DeviceBuffer::Gpu(_) => DeviceKind::Gpu,
        }
    }

    /// Capacity in `f32` elements
    pub fn len(&self) -> usize {
        match self {
            DeviceBuffer::Host(b) => b.len(),
            DeviceBuffer::Gpu(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/* ------------------------------------------------------------------------- */
/* Streams                                                                   */
/* ------------------------------------------------------------------------- */

type HostTask = Box<dyn FnOnce() + Send>;

/// In-order host work queue. `enqueue` only records the task; nothing runs
/// until `synchronize`.
#[derive(Clone, Default)]
pub struct HostStream {
    pending: Arc<Mutex<VecDeque<HostTask>>>,
}

impl HostStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending.lock().push_back(Box::new(task));
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Drain the queue in submission order.
    pub fn synchronize(&self) {
        let mut ran = 0usize;
        loop {
            // release the lock before running so tasks may enqueue more work
            let task = self.pending.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        trace!(tasks = ran, "host stream synchronized");
    }
}

impl std::fmt::Debug for HostStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostStream").field("pending", &self.pending()).finish()
    }
}

type LaunchCheck = Box<dyn FnOnce() -> Result<()> + Send>;

/// Submission stream on a wgpu queue.
///
/// Launch outcomes the device has not reported yet are parked as checks
/// and resolved by `synchronize`, so enqueueing never waits on the device.
#[derive(Clone)]
pub struct GpuStream {
    ctx:    GpuContext,
    checks: Arc<Mutex<Vec<LaunchCheck>>>,
}

impl GpuStream {
    pub fn new(ctx: GpuContext) -> Self {
        Self { ctx, checks: Arc::default() }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Park a check to run after the queue drains.
    pub fn defer_check<F>(&self, check: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.checks.lock().push(Box::new(check));
    }

    pub fn pending_checks(&self) -> usize {
        self.checks.lock().len()
    }

    /// Wait for the queue, then run every parked check. Reports the first
    /// failing check; all of them are consumed either way.
    pub fn synchronize(&self) -> Result<()> {
        self.ctx.wait_idle()?;
        let checks = std::mem::take(&mut *self.checks.lock());
        let ran = checks.len();
        let mut first_err = None;
        for check in checks {
            if let Err(e) = check() {
                first_err.get_or_insert(e);
            }
        }
        trace!(checks = ran, "gpu stream synchronized");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// The command stream a host engine passes to `enqueue`
#[derive(Clone, From)]
pub enum Stream {
    Host(HostStream),
    Gpu(GpuStream),
}

impl Stream {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Stream::Host(_) => DeviceKind::Host,
            Stream::Gpu(_) => DeviceKind::Gpu,
        }
    }

    /// Block until all work enqueued so far has completed.
    pub fn synchronize(&self) -> Result<()> {
        match self {
            Stream::Host(s) => {
                s.synchronize();
                Ok(())
            }
            Stream::Gpu(s) => s.synchronize(),
        }
    }
}
