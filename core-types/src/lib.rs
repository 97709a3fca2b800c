use bytemuck::{Pod, Zeroable};
use std::fmt;

include!("generated_data_types.rs");

/// Maximum number of dimensions a shape can carry
pub const MAX_DIMS: usize = 8;

/// Memory layout of a tensor as negotiated with the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorFormat {
    /// Row-major, unpadded
    Linear,
    Chw2,
    Hwc8,
    Chw4,
    Chw16,
    Chw32,
}

impl TensorFormat {
    pub const ALL: [TensorFormat; 6] = [
        TensorFormat::Linear,
        TensorFormat::Chw2,
        TensorFormat::Hwc8,
        TensorFormat::Chw4,
        TensorFormat::Chw16,
        TensorFormat::Chw32,
    ];
}

/// Per-instance extents of a tensor (the batch dimension is not included)
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct Dims {
    pub nb_dims: u32,
    pub d:       [u32; MAX_DIMS],
}

impl Dims {
    /// Build from extents; `None` when the rank exceeds `MAX_DIMS` or an
    /// extent does not fit in 32 bits.
    pub fn new(extents: &[usize]) -> Option<Self> {
        if extents.len() > MAX_DIMS {
            return None;
        }
        let mut dims = Dims::zeroed();
        dims.nb_dims = extents.len() as u32;
        for (slot, &e) in dims.d.iter_mut().zip(extents) {
            *slot = u32::try_from(e).ok()?;
        }
        Some(dims)
    }

    pub fn rank(&self) -> usize {
        self.nb_dims as usize
    }

    /// The live extents
    pub fn as_slice(&self) -> &[u32] {
        &self.d[..self.rank().min(MAX_DIMS)]
    }

    /// Number of scalar elements (1 for a rank-0 shape), `None` on overflow
    pub fn volume(&self) -> Option<usize> {
        self.as_slice()
            .iter()
            .try_fold(1usize, |acc, &e| acc.checked_mul(e as usize))
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, e) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, ")")
    }
}
