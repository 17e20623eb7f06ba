use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Serving backend that loads a compiled artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnginePlatform {
    TensorRtPlan,
    OnnxRuntimeOnnx,
}

impl EnginePlatform {
    /// Resolves the platform from the optimizer's module kind by suffix,
    /// e.g. `nebullvm.operations.inference_learners.tensor_rt`.
    pub fn from_module_kind(module_kind: &str) -> Result<Self, ConfigError> {
        if module_kind.ends_with("tensor_rt") {
            Ok(EnginePlatform::TensorRtPlan)
        } else if module_kind.ends_with("onnx") {
            Ok(EnginePlatform::OnnxRuntimeOnnx)
        } else {
            Err(ConfigError::UnknownEngineKind(module_kind.to_string()))
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            EnginePlatform::TensorRtPlan => "tensorrt_plan",
            EnginePlatform::OnnxRuntimeOnnx => "onnxruntime_onnx",
        }
    }

    /// First `_`-separated segment of the identifier; used in directory names.
    pub fn family(&self) -> &'static str {
        let id = self.identifier();
        id.split('_').next().unwrap_or(id)
    }
}

impl fmt::Display for EnginePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Where the server places model instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    #[default]
    Gpu,
}

impl DeviceKind {
    pub fn as_pbtxt(&self) -> &'static str {
        match self {
            DeviceKind::Cpu => "KIND_CPU",
            DeviceKind::Gpu => "KIND_GPU",
        }
    }
}

impl FromStr for DeviceKind {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("cpu") {
            return Ok(DeviceKind::Cpu);
        }
        if raw.eq_ignore_ascii_case("gpu") || raw.eq_ignore_ascii_case("cuda") {
            return Ok(DeviceKind::Gpu);
        }
        Err(ConfigError::UnknownDeviceKind(raw.to_string()))
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => f.write_str("cpu"),
            DeviceKind::Gpu => f.write_str("gpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_dispatch_by_suffix() {
        assert_eq!(
            EnginePlatform::from_module_kind("nebullvm.operations.inference_learners.tensor_rt")
                .unwrap(),
            EnginePlatform::TensorRtPlan
        );
        assert_eq!(
            EnginePlatform::from_module_kind("modelport.optimizers.onnx").unwrap(),
            EnginePlatform::OnnxRuntimeOnnx
        );
        for bad in ["openvino", "onnx.runtime", "tensor_rt_v2", ""] {
            assert!(matches!(
                EnginePlatform::from_module_kind(bad),
                Err(ConfigError::UnknownEngineKind(_))
            ));
        }
    }

    #[test]
    fn family_is_first_identifier_segment() {
        assert_eq!(EnginePlatform::TensorRtPlan.family(), "tensorrt");
        assert_eq!(EnginePlatform::OnnxRuntimeOnnx.family(), "onnxruntime");
    }

    #[test]
    fn device_kind_parsing() {
        assert_eq!("cpu".parse::<DeviceKind>().unwrap(), DeviceKind::Cpu);
        assert_eq!("GPU".parse::<DeviceKind>().unwrap(), DeviceKind::Gpu);
        assert_eq!("cuda".parse::<DeviceKind>().unwrap(), DeviceKind::Gpu);
        assert!(matches!(
            "tpu".parse::<DeviceKind>(),
            Err(ConfigError::UnknownDeviceKind(_))
        ));
    }
}
