use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::ConfigError;

/// Dimension value marking an axis resolved per request by the server.
pub const DYNAMIC_DIM: i64 = -1;

/// Serving-side element types. Only the two the optimizer reports are modeled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int32,
    Fp32,
}

impl DataType {
    /// Maps an optimizer-declared dtype (`int` / `float`).
    pub fn from_declared(raw: &str) -> Result<Self, ConfigError> {
        match raw {
            "int" => Ok(DataType::Int32),
            "float" => Ok(DataType::Fp32),
            other => Err(ConfigError::UnknownDataType(other.to_string())),
        }
    }

    pub fn as_pbtxt(&self) -> &'static str {
        match self {
            DataType::Int32 => "TYPE_INT32",
            DataType::Fp32 => "TYPE_FP32",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_pbtxt())
    }
}

/// Resolved extents, batch axis first. `DYNAMIC_DIM` marks dynamic axes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims(pub SmallVec<[i64; 6]>);

impl Dims {
    pub fn from_slice(d: &[i64]) -> Self {
        Self(d.iter().copied().collect())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn is_dynamic(&self, axis: usize) -> bool {
        self.0.get(axis).is_some_and(|d| *d == DYNAMIC_DIM)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl PartialEq<[i64]> for Dims {
    fn eq(&self, other: &[i64]) -> bool {
        self.0.as_slice() == other
    }
}

impl<const N: usize> PartialEq<[i64; N]> for Dims {
    fn eq(&self, other: &[i64; N]) -> bool {
        self.0.as_slice() == other.as_slice()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDescriptor {
    pub name: String,
    pub data_type: DataType,
    pub dims: Dims,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_dtypes_map_to_serving_types() {
        assert_eq!(DataType::from_declared("int").unwrap(), DataType::Int32);
        assert_eq!(DataType::from_declared("float").unwrap(), DataType::Fp32);
    }

    #[test]
    fn unknown_dtype_is_rejected() {
        for raw in ["double", "INT", "", "float16"] {
            let err = DataType::from_declared(raw).unwrap_err();
            assert!(matches!(err, ConfigError::UnknownDataType(ref s) if s == raw));
        }
    }
}
