/// Element types a graph engine can negotiate for a tensor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    F16,
    I8,
    I32,
    Bool,
}

impl DataType {
    /// Every supported element type, in declaration order
    pub const ALL: [DataType; 5] = [
        DataType::F32,
        DataType::F16,
        DataType::I8,
        DataType::I32,
        DataType::Bool,
    ];

    /// Size of one element, in bytes
    pub fn size_in_bytes(self) -> usize {
        match self {
            DataType::F32 => 4,
            DataType::F16 => 2,
            DataType::I8 => 1,
            DataType::I32 => 4,
            DataType::Bool => 1,
        }
    }
}

/// Marker-trait so we can go from T to DataType
pub trait Element: bytemuck::Pod {
    const DTYPE: DataType;
}

impl Element for f32 { const DTYPE: DataType = DataType::F32; }

impl Element for i8 { const DTYPE: DataType = DataType::I8; }

impl Element for i32 { const DTYPE: DataType = DataType::I32; }
