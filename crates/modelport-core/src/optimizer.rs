use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::DynamicInfo;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationTime {
    #[default]
    Constrained,
    Unconstrained,
}

/// One sample input tensor, batch axis excluded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInput {
    pub shape: Vec<usize>,
    #[serde(default = "default_dtype")]
    pub dtype: String,
}

fn default_dtype() -> String {
    "float".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub metric: String,
    pub metric_drop_ths: f32,
}

impl Default for MetricSpec {
    fn default() -> Self {
        Self {
            metric: "numeric_precision".to_string(),
            metric_drop_ths: 0.0,
        }
    }
}

/// Everything handed to the optimizer for one model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerArgs {
    pub model: PathBuf,
    pub batch_size: usize,
    pub input_data: Vec<SampleInput>,
    pub metric: String,
    pub metric_drop_ths: f32,
    pub optimization_time: OptimizationTime,
    pub dynamic_info: Option<DynamicInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_compilers: Vec<String>,
}

/// External model optimizer. Opaque to the conversion run: its errors
/// are passed through unchanged.
pub trait Optimizer {
    fn name(&self) -> &'static str;
    fn optimize(&self, args: &OptimizerArgs) -> Result<Box<dyn OptimizedModel>>;
}

pub trait OptimizedModel {
    /// Persists the result as `<path>/optimized_model/{metadata.json, artifact}`.
    fn save(&self, path: &Path) -> Result<()>;
}
