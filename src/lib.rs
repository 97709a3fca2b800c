//! Custom clip (clamp-to-range) plugin for a compute-graph engine.
//!
//! The engine talks to [`PluginRegistry`], [`PluginCreator`] and
//! [`PluginV2`]; kernels run on a [`Stream`] over [`DeviceBuffer`]s.

pub use clip_kernels::{ClipKernel, DefaultClipKernel};
pub use cliprt_core::{
    DeviceBuffer, DeviceConfig, DeviceKind, GpuBuffer, GpuContext, GpuStream, HostBuffer,
    HostStream, Stream,
};
pub use cliprt_plugin::{
    ClipPlugin, ClipPluginCreator, FieldData, PluginCreator, PluginError, PluginField,
    PluginFieldType, PluginRegistry, PluginV2,
};
pub use core_types::{DataType, Dims, TensorFormat};

use tracing_subscriber::EnvFilter;

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`
/// (default `warn`). Calling it again is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
