use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Axis index -> label. Keys arrive as JSON strings (`"0"`) and are parsed.
pub type DynamicAxes = BTreeMap<usize, String>;

/// Optimizer result metadata (`optimized_model/metadata.json`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    #[serde(alias = "module_name")]
    pub module_kind: String,
    pub input_names: Vec<String>,
    pub output_names: Vec<String>,
    pub network_parameters: NetworkParameters,
    /// Primary artifact file inside `optimized_model/`, when the optimizer names it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_filename: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub batch_size: usize,
    pub input_infos: Vec<InputInfo>,
    pub output_sizes: Vec<Vec<usize>>,
    #[serde(default)]
    pub dynamic_info: Option<DynamicInfo>,
}

/// Static (non-batch) extents and declared dtype of one input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputInfo {
    pub size: Vec<usize>,
    pub dtype: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicInfo {
    pub inputs: Vec<DynamicAxes>,
    pub outputs: Vec<DynamicAxes>,
}

impl ModelDescription {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Checks the cross-field length invariants the builder relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let params = &self.network_parameters;

        if params.batch_size == 0 {
            return Err(ConfigError::MalformedMetadata(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.input_names.len() != params.input_infos.len() {
            return Err(ConfigError::MalformedMetadata(format!(
                "{} input names but {} input infos",
                self.input_names.len(),
                params.input_infos.len()
            )));
        }
        if self.output_names.len() != params.output_sizes.len() {
            return Err(ConfigError::MalformedMetadata(format!(
                "{} output names but {} output sizes",
                self.output_names.len(),
                params.output_sizes.len()
            )));
        }
        ensure_unique("input", &self.input_names)?;
        ensure_unique("output", &self.output_names)?;

        if let Some(dynamic) = &params.dynamic_info {
            if dynamic.inputs.len() != self.input_names.len() {
                return Err(ConfigError::MalformedMetadata(format!(
                    "dynamic_info lists {} inputs, model has {}",
                    dynamic.inputs.len(),
                    self.input_names.len()
                )));
            }
            if dynamic.outputs.len() != self.output_names.len() {
                return Err(ConfigError::MalformedMetadata(format!(
                    "dynamic_info lists {} outputs, model has {}",
                    dynamic.outputs.len(),
                    self.output_names.len()
                )));
            }
        }

        Ok(())
    }

    pub fn input_axes(&self, index: usize) -> Option<&DynamicAxes> {
        self.network_parameters
            .dynamic_info
            .as_ref()
            .and_then(|d| d.inputs.get(index))
    }

    pub fn output_axes(&self, index: usize) -> Option<&DynamicAxes> {
        self.network_parameters
            .dynamic_info
            .as_ref()
            .and_then(|d| d.outputs.get(index))
    }
}

fn ensure_unique(kind: &str, names: &[String]) -> Result<(), ConfigError> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(ConfigError::MalformedMetadata(format!(
                "duplicate {kind} name `{name}`"
            )));
        }
    }
    Ok(())
}
