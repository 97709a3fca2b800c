use std::sync::Arc;

use clip_kernels::{ClipKernel, DefaultClipKernel, STATUS_SUCCESS};
use cliprt_core::{DeviceBuffer, Stream};
use core_types::{DataType, Dims, TensorFormat};
use tracing::{debug, trace, warn};

use crate::codec::{BufferReader, BufferWriter};
use crate::plugin::{PluginCreator, PluginV2};
use crate::register_creator;
use crate::types::{FieldData, PluginError, PluginField, PluginFieldType, RegistrationInfo, Result};

const CLIP_PLUGIN_NAME: &str = "CustomClipOperator";
const CLIP_PLUGIN_VERSION: &str = "1";

const FIELD_CLIP_MIN: &str = "clipMin";
const FIELD_CLIP_MAX: &str = "clipMax";

/// Two `f32` bounds
pub const CLIP_SERIALIZED_SIZE: usize = 2 * std::mem::size_of::<f32>();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PluginState {
    Unconfigured,
    Configured { input_volume: usize },
}

/// Clamps every element of its single input into `[clip_min, clip_max]`.
pub struct ClipPlugin {
    layer_name: String,
    clip_min:   f32,
    clip_max:   f32,
    state:      PluginState,
    namespace:  String,
    kernel:     Arc<dyn ClipKernel>,
}

impl ClipPlugin {
    pub fn new(name: &str, clip_min: f32, clip_max: f32) -> Self {
        Self::with_kernel(name, clip_min, clip_max, Arc::new(DefaultClipKernel::new()))
    }

    pub fn with_kernel(name: &str, clip_min: f32, clip_max: f32, kernel: Arc<dyn ClipKernel>) -> Self {
        if clip_min > clip_max {
            warn!(layer = name, clip_min, clip_max, "inverted clip range, every element becomes clip_max");
        }
        debug!(layer = name, clip_min, clip_max, "created clip plugin");
        Self {
            layer_name: name.to_string(),
            clip_min,
            clip_max,
            state: PluginState::Unconfigured,
            namespace: String::new(),
            kernel,
        }
    }

    /// Rebuild from a blob written by `serialize`.
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_kernel(name, data, Arc::new(DefaultClipKernel::new()))
    }

    pub fn from_bytes_with_kernel(name: &str, data: &[u8], kernel: Arc<dyn ClipKernel>) -> Result<Self> {
        // same order as serialize
        let mut reader = BufferReader::new(data);
        let clip_min: f32 = reader.read()?;
        let clip_max: f32 = reader.read()?;
        reader.finish()?;

        debug!(layer = name, bytes = data.len(), "deserialized clip plugin");
        Ok(Self::with_kernel(name, clip_min, clip_max, kernel))
    }

    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    pub fn clip_min(&self) -> f32 {
        self.clip_min
    }

    pub fn clip_max(&self) -> f32 {
        self.clip_max
    }

    /// Elements per batch item, once configured
    pub fn input_volume(&self) -> Option<usize> {
        match self.state {
            PluginState::Configured { input_volume } => Some(input_volume),
            PluginState::Unconfigured => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.input_volume().is_some()
    }
}

impl PluginV2 for ClipPlugin {
    fn plugin_type(&self) -> &'static str {
        CLIP_PLUGIN_NAME
    }

    fn plugin_version(&self) -> &'static str {
        CLIP_PLUGIN_VERSION
    }

    fn nb_outputs(&self) -> usize {
        1
    }

    fn output_dimensions(&self, index: usize, inputs: &[Dims]) -> Result<Dims> {
        if index != 0 {
            return Err(PluginError::InvalidArgument(format!(
                "clip has a single output, asked for output {index}"
            )));
        }
        match inputs {
            // clipping preserves the shape
            [dims] => Ok(*dims),
            _ => Err(PluginError::InvalidArgument(format!(
                "clip takes exactly one input, got {}",
                inputs.len()
            ))),
        }
    }

    fn supports_format(&self, dtype: DataType, format: TensorFormat) -> bool {
        dtype == DataType::F32 && format == TensorFormat::Linear
    }

    fn configure_with_format(
        &mut self,
        inputs:         &[Dims],
        outputs:        &[Dims],
        dtype:          DataType,
        format:         TensorFormat,
        max_batch_size: usize,
    ) -> Result<()> {
        if outputs.len() != 1 {
            return Err(PluginError::Configuration(format!(
                "expected exactly one output, got {}",
                outputs.len()
            )));
        }
        if !self.supports_format(dtype, format) {
            return Err(PluginError::Configuration(format!(
                "clip only runs on F32/Linear, got {dtype:?}/{format:?}"
            )));
        }
        let [input] = inputs else {
            return Err(PluginError::Configuration(format!(
                "expected exactly one input, got {}",
                inputs.len()
            )));
        };

        let input_volume = input.volume().ok_or_else(|| {
            PluginError::Configuration(format!("element count of {input} overflows"))
        })?;
        self.state = PluginState::Configured { input_volume };
        debug!(layer = %self.layer_name, dims = %input, input_volume, max_batch_size, "configured clip plugin");
        Ok(())
    }

    fn enqueue(
        &self,
        batch_size: usize,
        inputs:     &[&DeviceBuffer],
        outputs:    &[&DeviceBuffer],
        stream:     &Stream,
    ) -> Result<i32> {
        let PluginState::Configured { input_volume } = self.state else {
            return Err(PluginError::NotConfigured);
        };
        let (Some(input), Some(output)) = (inputs.first(), outputs.first()) else {
            return Err(PluginError::InvalidArgument(format!(
                "clip needs one input and one output buffer, got {} and {}",
                inputs.len(),
                outputs.len()
            )));
        };
        let count = input_volume.checked_mul(batch_size).ok_or_else(|| {
            PluginError::InvalidArgument(format!(
                "element count overflows: {input_volume} x {batch_size}"
            ))
        })?;

        trace!(layer = %self.layer_name, batch_size, count, "enqueue clip");
        let status = self.kernel.clip(stream, count, self.clip_min, self.clip_max, input, output);
        if status != STATUS_SUCCESS {
            warn!(layer = %self.layer_name, status, "clip kernel returned an error status");
        }
        Ok(status)
    }

    fn serialization_size(&self) -> usize {
        CLIP_SERIALIZED_SIZE
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<usize> {
        if buffer.len() < CLIP_SERIALIZED_SIZE {
            return Err(PluginError::InvalidArgument(format!(
                "serialization buffer too small: need {CLIP_SERIALIZED_SIZE} bytes, have {}",
                buffer.len()
            )));
        }
        let mut writer = BufferWriter::new(&mut buffer[..CLIP_SERIALIZED_SIZE]);
        writer.write(self.clip_min)?;
        writer.write(self.clip_max)?;
        Ok(writer.written())
    }

    fn clone_plugin(&self) -> Box<dyn PluginV2> {
        let mut plugin = ClipPlugin::with_kernel(&self.layer_name, self.clip_min, self.clip_max, self.kernel.clone());
        plugin.set_plugin_namespace(&self.namespace);
        Box::new(plugin)
    }

    fn destroy(self: Box<Self>) {
        debug!(layer = %self.layer_name, "destroying clip plugin");
    }

    fn set_plugin_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
    }

    fn plugin_namespace(&self) -> &str {
        &self.namespace
    }
}


/// Builds `ClipPlugin`s from fields or serialized blobs
pub struct ClipPluginCreator {
    fields:    Vec<PluginField>,
    namespace: String,
    kernel:    Arc<dyn ClipKernel>,
}

impl ClipPluginCreator {
    pub fn new() -> Self {
        Self::with_kernel(Arc::new(DefaultClipKernel::new()))
    }

    /// A creator whose plugins all call `kernel`
    pub fn with_kernel(kernel: Arc<dyn ClipKernel>) -> Self {
        Self {
            fields: vec![
                PluginField::descriptor(FIELD_CLIP_MIN, PluginFieldType::Float32, 1),
                PluginField::descriptor(FIELD_CLIP_MAX, PluginFieldType::Float32, 1),
            ],
            namespace: String::new(),
            kernel,
        }
    }
}

impl Default for ClipPluginCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationInfo for ClipPluginCreator {
    const NAME: &'static str = CLIP_PLUGIN_NAME;
    const VERSION: &'static str = CLIP_PLUGIN_VERSION;
}

/// The single `f32` carried by a bound field
fn scalar_f32(field: &PluginField, name: &'static str) -> Result<f32> {
    if field.field_type != PluginFieldType::Float32 || field.length != 1 {
        return Err(PluginError::InvalidArgument(format!(
            "field `{name}` must be one Float32, declared {:?} x{}",
            field.field_type, field.length
        )));
    }
    match &field.data {
        Some(FieldData::Float32(v)) if v.len() == 1 => Ok(v[0]),
        other => Err(PluginError::InvalidArgument(format!(
            "field `{name}` payload does not match its declaration: {other:?}"
        ))),
    }
}

impl PluginCreator for ClipPluginCreator {
    fn plugin_name(&self) -> &'static str {
        CLIP_PLUGIN_NAME
    }

    fn plugin_version(&self) -> &'static str {
        CLIP_PLUGIN_VERSION
    }

    fn field_names(&self) -> &[PluginField] {
        &self.fields
    }

    fn create_plugin(&self, name: &str, fields: &[PluginField]) -> Result<Box<dyn PluginV2>> {
        if fields.len() != self.fields.len() {
            return Err(PluginError::InvalidArgument(format!(
                "clip expects {} fields, got {}",
                self.fields.len(),
                fields.len()
            )));
        }

        let mut clip_min = None;
        let mut clip_max = None;
        for field in fields {
            match field.name.as_str() {
                FIELD_CLIP_MIN => clip_min = Some(scalar_f32(field, FIELD_CLIP_MIN)?),
                FIELD_CLIP_MAX => clip_max = Some(scalar_f32(field, FIELD_CLIP_MAX)?),
                other => warn!(layer = name, field = other, "ignoring unrecognized clip field"),
            }
        }
        let clip_min = clip_min.ok_or(PluginError::MissingField(FIELD_CLIP_MIN))?;
        let clip_max = clip_max.ok_or(PluginError::MissingField(FIELD_CLIP_MAX))?;

        Ok(Box::new(ClipPlugin::with_kernel(name, clip_min, clip_max, self.kernel.clone())))
    }

    fn deserialize_plugin(&self, name: &str, data: &[u8]) -> Result<Box<dyn PluginV2>> {
        Ok(Box::new(ClipPlugin::from_bytes_with_kernel(name, data, self.kernel.clone())?))
    }

    fn set_plugin_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
    }

    fn plugin_namespace(&self) -> &str {
        &self.namespace
    }
}

register_creator!(ClipPluginCreator);


#[cfg(test)]
mod tests {
    use super::*;
    use cliprt_core::{GpuContext, HostBuffer, HostStream};
    use core_types::MAX_DIMS;
    use pollster::block_on;
    use std::sync::Mutex;

    /// Records every launch instead of touching buffers
    #[derive(Default)]
    struct RecordingKernel {
        launches: Mutex<Vec<(usize, f32, f32)>>,
        status:   i32,
    }

    impl ClipKernel for RecordingKernel {
        fn clip(&self, _: &Stream, count: usize, lo: f32, hi: f32, _: &DeviceBuffer, _: &DeviceBuffer) -> i32 {
            self.launches.lock().unwrap().push((count, lo, hi));
            self.status
        }
    }

    fn dims(extents: &[usize]) -> Dims {
        Dims::new(extents).unwrap()
    }

    fn configure_f32(plugin: &mut ClipPlugin, shape: &[usize]) -> Result<()> {
        let d = dims(shape);
        plugin.configure_with_format(&[d], &[d], DataType::F32, TensorFormat::Linear, 8)
    }

    fn host_buf(data: &[f32]) -> DeviceBuffer {
        DeviceBuffer::from(HostBuffer::from_vec(data.to_vec()))
    }

    #[test]
    fn identity_and_outputs() {
        let plugin = ClipPlugin::new("clip_0", -1.0, 1.0);
        assert_eq!(plugin.plugin_type(), "CustomClipOperator");
        assert_eq!(plugin.plugin_version(), "1");
        assert_eq!(plugin.nb_outputs(), 1);
        assert_eq!(plugin.layer_name(), "clip_0");
        assert_eq!((plugin.clip_min(), plugin.clip_max()), (-1.0, 1.0));
        assert!(!plugin.is_configured());
        assert_eq!(plugin.workspace_size(32), 0);
    }

    #[test]
    fn output_dimensions_preserve_shape() {
        let plugin = ClipPlugin::new("clip", 0.0, 1.0);
        for rank in 1..=MAX_DIMS {
            let shape: Vec<usize> = (1..=rank).map(|i| i + 1).collect();
            let d = dims(&shape);
            assert_eq!(plugin.output_dimensions(0, &[d]).unwrap(), d);
        }

        let d = dims(&[3, 4]);
        assert!(matches!(plugin.output_dimensions(1, &[d]), Err(PluginError::InvalidArgument(_))));
        assert!(matches!(plugin.output_dimensions(0, &[]), Err(PluginError::InvalidArgument(_))));
        assert!(matches!(plugin.output_dimensions(0, &[d, d]), Err(PluginError::InvalidArgument(_))));
    }

    #[test]
    fn supports_only_linear_f32() {
        let plugin = ClipPlugin::new("clip", 0.0, 1.0);
        for dtype in DataType::ALL {
            for format in TensorFormat::ALL {
                let expected = dtype == DataType::F32 && format == TensorFormat::Linear;
                assert_eq!(plugin.supports_format(dtype, format), expected, "{dtype:?}/{format:?}");
            }
        }
    }

    #[test]
    fn configure_rejects_unsupported_setups() {
        let mut plugin = ClipPlugin::new("clip", 0.0, 1.0);
        let d = dims(&[4]);

        let cases = [
            plugin.configure_with_format(&[d], &[d, d], DataType::F32, TensorFormat::Linear, 1),
            plugin.configure_with_format(&[d], &[d], DataType::F16, TensorFormat::Linear, 1),
            plugin.configure_with_format(&[d], &[d], DataType::F32, TensorFormat::Chw4, 1),
            plugin.configure_with_format(&[], &[d], DataType::F32, TensorFormat::Linear, 1),
        ];
        for result in cases {
            assert!(matches!(result, Err(PluginError::Configuration(_))));
        }
        assert!(!plugin.is_configured());
    }

    #[test]
    fn configure_rejects_overflowing_volume() {
        let mut plugin = ClipPlugin::new("clip", 0.0, 1.0);
        let small = dims(&[2, 3]);
        plugin
            .configure_with_format(&[small], &[small], DataType::F32, TensorFormat::Linear, 1)
            .unwrap();

        let huge = dims(&[65536; MAX_DIMS]);
        let result = plugin.configure_with_format(&[huge], &[huge], DataType::F32, TensorFormat::Linear, 1);
        assert!(matches!(result, Err(PluginError::Configuration(_))));
        // previous configuration survives
        assert_eq!(plugin.input_volume(), Some(6));
    }

    #[test]
    fn enqueue_before_configure_is_an_error() {
        let kernel = Arc::new(RecordingKernel::default());
        let plugin = ClipPlugin::with_kernel("clip", 0.0, 1.0, kernel.clone());
        let stream = Stream::from(HostStream::new());
        let buf = host_buf(&[0.0; 4]);

        assert_eq!(plugin.enqueue(1, &[&buf], &[&buf], &stream), Err(PluginError::NotConfigured));
        assert!(kernel.launches.lock().unwrap().is_empty());
    }

    #[test]
    fn element_count_scales_with_batch() {
        let kernel = Arc::new(RecordingKernel::default());
        let mut plugin = ClipPlugin::with_kernel("clip", -0.5, 0.5, kernel.clone());
        configure_f32(&mut plugin, &[2, 3, 4]).unwrap();
        assert_eq!(plugin.input_volume(), Some(24));

        let stream = Stream::from(HostStream::new());
        let buf = host_buf(&[0.0; 96]);
        assert_eq!(plugin.enqueue(1, &[&buf], &[&buf], &stream), Ok(0));
        assert_eq!(plugin.enqueue(4, &[&buf], &[&buf], &stream), Ok(0));

        let launches = kernel.launches.lock().unwrap();
        assert_eq!(*launches, vec![(24, -0.5, 0.5), (96, -0.5, 0.5)]);
    }

    #[test]
    fn kernel_status_is_returned_unchanged() {
        let kernel = Arc::new(RecordingKernel { status: 700, ..Default::default() });
        let mut plugin = ClipPlugin::with_kernel("clip", 0.0, 1.0, kernel);
        configure_f32(&mut plugin, &[1]).unwrap();

        let stream = Stream::from(HostStream::new());
        let buf = host_buf(&[0.0]);
        assert_eq!(plugin.enqueue(1, &[&buf], &[&buf], &stream), Ok(700));
        assert!(matches!(
            plugin.enqueue(1, &[], &[&buf], &stream),
            Err(PluginError::InvalidArgument(_))
        ));
    }

    #[test]
    fn clips_end_to_end_on_host() {
        let mut plugin = ClipPlugin::new("clip", 0.0, 1.0);
        configure_f32(&mut plugin, &[3]).unwrap();

        let stream = Stream::from(HostStream::new());
        let input = host_buf(&[-1.0, 0.5, 2.0]);
        let out = HostBuffer::zeroed(3);
        let output = DeviceBuffer::from(out.clone());

        assert_eq!(plugin.enqueue(1, &[&input], &[&output], &stream), Ok(STATUS_SUCCESS));
        stream.synchronize().unwrap();
        assert_eq!(out.to_vec(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn clips_end_to_end_on_gpu() {
        let Ok(ctx) = block_on(GpuContext::new()) else {
            eprintln!("skipping GPU test: no adapter");
            return;
        };
        let mut plugin = ClipPlugin::new("clip", 0.0, 1.0);
        configure_f32(&mut plugin, &[3]).unwrap();

        let stream = Stream::from(ctx.stream());
        let input = DeviceBuffer::from(ctx.upload_f32(&[-1.0, 0.5, 2.0, 7.0, -3.0, 0.25]));
        let out = ctx.alloc_f32(6);
        let output = DeviceBuffer::from(out.clone());

        assert_eq!(plugin.enqueue(2, &[&input], &[&output], &stream), Ok(STATUS_SUCCESS));
        stream.synchronize().unwrap();
        assert_eq!(ctx.download_f32(&out).unwrap(), vec![0.0, 0.5, 1.0, 1.0, 0.0, 0.25]);
    }

    #[test]
    fn serialize_writes_min_then_max() {
        let plugin = ClipPlugin::new("clip", -2.5, 6.0);
        assert_eq!(plugin.serialization_size(), 8);

        let mut buf = [0xFFu8; 10];
        assert_eq!(plugin.serialize(&mut buf).unwrap(), 8);
        assert_eq!(&buf[..4], &(-2.5f32).to_ne_bytes());
        assert_eq!(&buf[4..8], &6.0f32.to_ne_bytes());
        assert_eq!(&buf[8..], &[0xFF, 0xFF]);

        let mut short = [0u8; 7];
        assert!(matches!(plugin.serialize(&mut short), Err(PluginError::InvalidArgument(_))));
        assert_eq!(short, [0u8; 7]);
    }

    #[test]
    fn deserialize_rejects_wrong_length() {
        let mut blob = [0u8; 8];
        ClipPlugin::new("clip", 1.0, 2.0).serialize(&mut blob).unwrap();

        let plugin = ClipPlugin::from_bytes("restored", &blob).unwrap();
        assert_eq!((plugin.clip_min(), plugin.clip_max()), (1.0, 2.0));
        assert!(!plugin.is_configured());
        assert_eq!(plugin.plugin_namespace(), "");

        assert_eq!(
            ClipPlugin::from_bytes("clip", &blob[..4]).err(),
            Some(PluginError::Deserialization { expected: 8, found: 4 })
        );
        assert_eq!(
            ClipPlugin::from_bytes("clip", &[]).err(),
            Some(PluginError::Deserialization { expected: 4, found: 0 })
        );
        let long = [0u8; 12];
        assert_eq!(
            ClipPlugin::from_bytes("clip", &long).err(),
            Some(PluginError::Deserialization { expected: 8, found: 12 })
        );
    }

    #[test]
    fn clone_keeps_bounds_and_namespace_but_not_configuration() {
        let kernel = Arc::new(RecordingKernel::default());
        let mut plugin = ClipPlugin::with_kernel("clip", -3.0, 3.0, kernel.clone());
        plugin.set_plugin_namespace("vision");
        configure_f32(&mut plugin, &[10]).unwrap();

        let copy = plugin.clone_plugin();
        assert_eq!(copy.plugin_namespace(), "vision");

        let mut blob = [0u8; 8];
        copy.serialize(&mut blob).unwrap();
        let restored = ClipPlugin::from_bytes("clip", &blob).unwrap();
        assert_eq!((restored.clip_min(), restored.clip_max()), (-3.0, 3.0));

        let stream = Stream::from(HostStream::new());
        let buf = host_buf(&[0.0; 10]);
        assert_eq!(copy.enqueue(1, &[&buf], &[&buf], &stream), Err(PluginError::NotConfigured));

        copy.destroy();
        Box::new(plugin).destroy();
    }

    #[test]
    fn creator_publishes_two_float_fields() {
        let creator = ClipPluginCreator::new();
        assert_eq!(creator.plugin_name(), "CustomClipOperator");
        assert_eq!(creator.plugin_version(), "1");

        let fields = creator.field_names();
        assert_eq!(fields.len(), 2);
        for (field, name) in fields.iter().zip(["clipMin", "clipMax"]) {
            assert_eq!(field.name, name);
            assert_eq!(field.field_type, PluginFieldType::Float32);
            assert_eq!(field.length, 1);
            assert!(field.data.is_none());
        }
    }

    fn bounds_of(plugin: &dyn PluginV2) -> (f32, f32) {
        let mut blob = [0u8; 8];
        plugin.serialize(&mut blob).unwrap();
        let p = ClipPlugin::from_bytes("probe", &blob).unwrap();
        (p.clip_min(), p.clip_max())
    }

    #[test]
    fn create_plugin_is_order_independent() {
        let creator = ClipPluginCreator::new();
        let forward = [PluginField::f32("clipMin", -1.0), PluginField::f32("clipMax", 4.0)];
        let reversed = [PluginField::f32("clipMax", 4.0), PluginField::f32("clipMin", -1.0)];

        let a = creator.create_plugin("a", &forward).unwrap();
        let b = creator.create_plugin("b", &reversed).unwrap();
        assert_eq!(bounds_of(a.as_ref()), (-1.0, 4.0));
        assert_eq!(bounds_of(a.as_ref()), bounds_of(b.as_ref()));
    }

    #[test]
    fn create_plugin_rejects_malformed_fields() {
        let creator = ClipPluginCreator::new();
        let min = PluginField::f32("clipMin", 0.0);
        let max = PluginField::f32("clipMax", 1.0);

        // wrong count
        assert!(matches!(creator.create_plugin("c", &[min.clone()]), Err(PluginError::InvalidArgument(_))));
        assert!(matches!(
            creator.create_plugin("c", &[min.clone(), max.clone(), max.clone()]),
            Err(PluginError::InvalidArgument(_))
        ));

        // unknown names are skipped, which leaves a bound unset
        let other = PluginField::f32("ClipMax", 1.0);
        assert_eq!(
            creator.create_plugin("c", &[min.clone(), other]).err(),
            Some(PluginError::MissingField("clipMax"))
        );
        assert_eq!(
            creator.create_plugin("c", &[max.clone(), max.clone()]).err(),
            Some(PluginError::MissingField("clipMin"))
        );

        // declared type and payload must both be one f32
        let as_int = PluginField::new("clipMin", FieldData::Int32(vec![0]));
        assert!(matches!(creator.create_plugin("c", &[as_int, max.clone()]), Err(PluginError::InvalidArgument(_))));
        let two = PluginField::new("clipMin", FieldData::Float32(vec![0.0, 1.0]));
        assert!(matches!(creator.create_plugin("c", &[two, max.clone()]), Err(PluginError::InvalidArgument(_))));
        let lying = PluginField { data: Some(FieldData::Float64(vec![0.0])), ..min.clone() };
        assert!(matches!(creator.create_plugin("c", &[lying, max.clone()]), Err(PluginError::InvalidArgument(_))));
        let empty = PluginField::descriptor("clipMin", PluginFieldType::Float32, 1);
        assert!(matches!(creator.create_plugin("c", &[empty, max]), Err(PluginError::InvalidArgument(_))));
    }

    #[test]
    fn inverted_range_is_accepted() {
        let creator = ClipPluginCreator::new();
        let fields = [PluginField::f32("clipMin", 5.0), PluginField::f32("clipMax", -5.0)];
        let mut plugin = creator.create_plugin("inv", &fields).unwrap();
        plugin
            .configure_with_format(&[dims(&[2])], &[dims(&[2])], DataType::F32, TensorFormat::Linear, 1)
            .unwrap();

        let stream = Stream::from(HostStream::new());
        let input = host_buf(&[-10.0, 10.0]);
        let out = HostBuffer::zeroed(2);
        let output = DeviceBuffer::from(out.clone());
        assert_eq!(plugin.enqueue(1, &[&input], &[&output], &stream), Ok(0));
        stream.synchronize().unwrap();
        assert_eq!(out.to_vec(), vec![-5.0, -5.0]);
    }

    #[test]
    fn creator_deserializes_and_shares_its_kernel() {
        let kernel = Arc::new(RecordingKernel::default());
        let creator = ClipPluginCreator::with_kernel(kernel.clone());

        let mut blob = [0u8; 8];
        ClipPlugin::new("src", 0.25, 0.75).serialize(&mut blob).unwrap();
        let mut plugin = creator.deserialize_plugin("loaded", &blob).unwrap();
        assert_eq!(bounds_of(plugin.as_ref()), (0.25, 0.75));

        plugin.configure_with_format(&[dims(&[5])], &[dims(&[5])], DataType::F32, TensorFormat::Linear, 1).unwrap();
        plugin.initialize().unwrap();
        let stream = Stream::from(HostStream::new());
        let buf = host_buf(&[0.0; 5]);
        plugin.enqueue(2, &[&buf], &[&buf], &stream).unwrap();
        plugin.terminate();
        assert_eq!(*kernel.launches.lock().unwrap(), vec![(10, 0.25, 0.75)]);

        assert!(matches!(
            creator.deserialize_plugin("bad", &blob[..6]),
            Err(PluginError::Deserialization { .. })
        ));
    }
}
