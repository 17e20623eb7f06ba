//! Serving configuration derived from optimizer metadata.
//!
//! [`ConfigDocumentBuilder::build`] is a pure function of its inputs; the
//! text form (`config.pbtxt`) is produced by the [`fmt::Display`] impl.

use std::fmt::{self, Write as _};

use serde::Serialize;
use tracing::debug;

use crate::{
    resolve_dims, ConfigError, DataType, DeviceKind, EnginePlatform, ModelDescription,
    TensorDescriptor,
};

/// File name the compiled artifact is stored under in the version directory.
pub const DEFAULT_ARTIFACT_FILENAME: &str = "model.bin";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct InstanceGroup {
    pub count: u32,
    pub device_kind: DeviceKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServingConfig {
    pub name: String,
    pub platform: EnginePlatform,
    /// Always 0: batching is carried by the per-request shapes.
    pub max_batch_size: u32,
    pub default_artifact_filename: String,
    pub inputs: Vec<TensorDescriptor>,
    pub outputs: Vec<TensorDescriptor>,
    pub instance_group: InstanceGroup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigDocumentBuilder {
    pub instance_count: u32,
    pub device_kind: DeviceKind,
}

impl Default for ConfigDocumentBuilder {
    fn default() -> Self {
        Self {
            instance_count: 1,
            device_kind: DeviceKind::Gpu,
        }
    }
}

impl ConfigDocumentBuilder {
    pub fn new(instance_count: u32, device_kind: DeviceKind) -> Self {
        Self {
            instance_count,
            device_kind,
        }
    }

    pub fn build(
        &self,
        desc: &ModelDescription,
        model_name: &str,
    ) -> Result<ServingConfig, ConfigError> {
        if self.instance_count == 0 {
            return Err(ConfigError::InvalidInstanceCount);
        }
        let platform = EnginePlatform::from_module_kind(&desc.module_kind)?;
        desc.validate()?;

        let params = &desc.network_parameters;

        let mut inputs = Vec::with_capacity(desc.input_names.len());
        for (index, (name, info)) in desc.input_names.iter().zip(&params.input_infos).enumerate() {
            let data_type = DataType::from_declared(&info.dtype)?;
            let dims = resolve_dims(name, params.batch_size, &info.size, desc.input_axes(index))?;
            debug!(tensor = %name, ?dims, %data_type, "resolved input");
            inputs.push(TensorDescriptor {
                name: name.clone(),
                data_type,
                dims,
            });
        }

        let mut outputs = Vec::with_capacity(desc.output_names.len());
        for (index, (name, size)) in desc.output_names.iter().zip(&params.output_sizes).enumerate() {
            let dims = resolve_dims(name, params.batch_size, size, desc.output_axes(index))?;
            debug!(tensor = %name, ?dims, "resolved output");
            outputs.push(TensorDescriptor {
                name: name.clone(),
                data_type: DataType::Fp32,
                dims,
            });
        }

        Ok(ServingConfig {
            name: format!("{model_name}_{}", platform.family()),
            platform,
            max_batch_size: 0,
            default_artifact_filename: DEFAULT_ARTIFACT_FILENAME.to_string(),
            inputs,
            outputs,
            instance_group: InstanceGroup {
                count: self.instance_count,
                device_kind: self.device_kind,
            },
        })
    }
}

impl ServingConfig {
    pub fn to_pbtxt(&self) -> String {
        self.to_string()
    }
}

/// Protobuf text format, fields in `ModelConfig` field-number order.
impl fmt::Display for ServingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name: {}", quoted(&self.name))?;
        writeln!(f, "platform: {}", quoted(self.platform.identifier()))?;
        writeln!(f, "max_batch_size: {}", self.max_batch_size)?;
        for input in &self.inputs {
            write_tensor(f, "input", input)?;
        }
        for output in &self.outputs {
            write_tensor(f, "output", output)?;
        }
        writeln!(f, "instance_group {{")?;
        writeln!(f, "  count: {}", self.instance_group.count)?;
        writeln!(f, "  kind: {}", self.instance_group.device_kind.as_pbtxt())?;
        writeln!(f, "}}")?;
        writeln!(
            f,
            "default_model_filename: {}",
            quoted(&self.default_artifact_filename)
        )
    }
}

fn write_tensor(f: &mut fmt::Formatter<'_>, field: &str, t: &TensorDescriptor) -> fmt::Result {
    writeln!(f, "{field} {{")?;
    writeln!(f, "  name: {}", quoted(&t.name))?;
    writeln!(f, "  data_type: {}", t.data_type.as_pbtxt())?;
    for d in t.dims.as_slice() {
        writeln!(f, "  dims: {d}")?;
    }
    writeln!(f, "}}")
}

fn quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Text format escapes are per byte of the UTF-8 encoding.
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(out, "\\{byte:03o}");
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::quoted;

    #[test]
    fn quoting_escapes_text_format_specials() {
        assert_eq!(quoted("plain"), "\"plain\"");
        assert_eq!(quoted("a\"b"), "\"a\\\"b\"");
        assert_eq!(quoted("a\\b"), "\"a\\\\b\"");
        assert_eq!(quoted("line\nbreak"), "\"line\\nbreak\"");
    }

    #[test]
    fn control_characters_escape_each_utf8_byte() {
        assert_eq!(quoted("a\u{1}b"), "\"a\\001b\"");
        assert_eq!(quoted("\u{85}"), "\"\\302\\205\"");
        assert_eq!(quoted("caf\u{e9}"), "\"caf\u{e9}\"");
    }
}
