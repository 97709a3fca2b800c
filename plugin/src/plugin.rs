use cliprt_core::{DeviceBuffer, Stream};
use core_types::{DataType, Dims, TensorFormat};

use crate::types::{PluginField, Result};


/// Hooks the host engine calls on one placed plugin instance.
///
/// The engine owns every instance it obtains from a creator and releases
/// it with `destroy`; nothing else ends an instance's life.
pub trait PluginV2: Send + Sync {
    fn plugin_type(&self) -> &'static str;
    fn plugin_version(&self) -> &'static str;

    /// Number of output tensors
    fn nb_outputs(&self) -> usize;

    /// Shape of output `index` given the input shapes
    fn output_dimensions(&self, index: usize, inputs: &[Dims]) -> Result<Dims>;

    /// Capability query used during format negotiation. Must be pure.
    fn supports_format(&self, dtype: DataType, format: TensorFormat) -> bool;

    /// Called once per build with the negotiated format.
    fn configure_with_format(
        &mut self,
        inputs:         &[Dims],
        outputs:        &[Dims],
        dtype:          DataType,
        format:         TensorFormat,
        max_batch_size: usize,
    ) -> Result<()>;

    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn terminate(&mut self) {}

    /// Scratch bytes needed by `enqueue`
    fn workspace_size(&self, _max_batch_size: usize) -> usize {
        0
    }

    /// Enqueue one batch on `stream`. `Ok` carries the kernel status as is.
    fn enqueue(
        &self,
        batch_size: usize,
        inputs:     &[&DeviceBuffer],
        outputs:    &[&DeviceBuffer],
        stream:     &Stream,
    ) -> Result<i32>;

    fn serialization_size(&self) -> usize;

    /// Write the plugin state into `buffer`, returning the bytes written.
    fn serialize(&self, buffer: &mut [u8]) -> Result<usize>;

    /// Unconfigured copy with the same parameters and namespace
    fn clone_plugin(&self) -> Box<dyn PluginV2>;

    fn destroy(self: Box<Self>);

    fn set_plugin_namespace(&mut self, namespace: &str);
    fn plugin_namespace(&self) -> &str;
}

/// Factory the engine uses to build and reload plugins of one type.
pub trait PluginCreator: Send + Sync {
    fn plugin_name(&self) -> &'static str;
    fn plugin_version(&self) -> &'static str;

    /// Construction parameters this creator expects
    fn field_names(&self) -> &[PluginField];

    fn create_plugin(&self, name: &str, fields: &[PluginField]) -> Result<Box<dyn PluginV2>>;

    fn deserialize_plugin(&self, name: &str, data: &[u8]) -> Result<Box<dyn PluginV2>>;

    fn set_plugin_namespace(&mut self, namespace: &str);
    fn plugin_namespace(&self) -> &str;
}


/// Wrapper for creator factory functions
pub struct CreatorFactory {
    pub name:    &'static str,
    pub version: &'static str,
    pub factory: fn() -> Box<dyn PluginCreator>,
}

// Collect all registered creators
inventory::collect!(CreatorFactory);
