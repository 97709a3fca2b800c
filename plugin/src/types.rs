use core_types::Dims;
use thiserror::Error;

/// Declared scalar type of a plugin field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PluginFieldType {
    Float16,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Char,
    Dims,
    Unknown,
}

/// Typed payload of a plugin field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldData {
    /// Raw IEEE-754 half bits
    Float16(Vec<u16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Char(String),
    Dims(Vec<Dims>),
}

impl FieldData {
    pub fn field_type(&self) -> PluginFieldType {
        match self {
            FieldData::Float16(_) => PluginFieldType::Float16,
            FieldData::Float32(_) => PluginFieldType::Float32,
            FieldData::Float64(_) => PluginFieldType::Float64,
            FieldData::Int8(_)    => PluginFieldType::Int8,
            FieldData::Int16(_)   => PluginFieldType::Int16,
            FieldData::Int32(_)   => PluginFieldType::Int32,
            FieldData::Char(_)    => PluginFieldType::Char,
            FieldData::Dims(_)    => PluginFieldType::Dims,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldData::Float16(v) => v.len(),
            FieldData::Float32(v) => v.len(),
            FieldData::Float64(v) => v.len(),
            FieldData::Int8(v)    => v.len(),
            FieldData::Int16(v)   => v.len(),
            FieldData::Int32(v)   => v.len(),
            FieldData::Char(s)    => s.len(),
            FieldData::Dims(v)    => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, typed construction parameter.
///
/// Descriptors published by a creator have `data: None`; entries handed to
/// `create_plugin` carry the values. `field_type` and `length` are what the
/// caller *declares*, and creators check them against what they expect.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginField {
    pub name:       String,
    pub data:       Option<FieldData>,
    pub field_type: PluginFieldType,
    pub length:     usize,
}

impl PluginField {
    /// A descriptor without a payload
    pub fn descriptor(name: impl Into<String>, field_type: PluginFieldType, length: usize) -> Self {
        Self { name: name.into(), data: None, field_type, length }
    }

    /// A field whose declared type and length follow its payload
    pub fn new(name: impl Into<String>, data: FieldData) -> Self {
        Self {
            name:       name.into(),
            field_type: data.field_type(),
            length:     data.len(),
            data:       Some(data),
        }
    }

    pub fn f32(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, FieldData::Float32(vec![value]))
    }
}

/// Errors surfaced to the host engine instead of aborting
#[derive(Debug, Error, PartialEq)]
pub enum PluginError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("required field `{0}` was not supplied")]
    MissingField(&'static str),

    #[error("corrupt serialized plugin: expected {expected} bytes, found {found}")]
    Deserialization { expected: usize, found: usize },

    #[error("unsupported configuration: {0}")]
    Configuration(String),

    #[error("plugin executed before configure_with_format")]
    NotConfigured,

    #[error("no creator registered for {name} v{version} in namespace `{namespace}`")]
    UnknownCreator { name: String, version: String, namespace: String },
}

pub type Result<T> = std::result::Result<T, PluginError>;

/// Implemented by each creator to work with inventory
pub trait RegistrationInfo {
    /// Plugin type name
    const NAME: &'static str;
    const VERSION: &'static str;
}
