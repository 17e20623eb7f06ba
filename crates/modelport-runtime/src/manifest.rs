//! Model descriptions backed by a `model.json` manifest.
//!
//! A model directory holds the manifest, the model file it names and the
//! pre/post-processing logic copied into the pipeline stage:
//!
//! ```text
//! resnet50/
//!   model.json
//!   resnet50.onnx
//!   pipeline.py
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use modelport_core::{DynamicInfo, MetricSpec, OptimizationTime, OptimizerArgs, SampleInput};
use serde::{Deserialize, Serialize};

use crate::{fetch_auxiliary_files, is_valid_model_name, AuxiliaryFile, ModelSource};

pub const MANIFEST_FILENAME: &str = "model.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub name: String,
    pub model_file: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub optimization_time: OptimizationTime,
    pub sample_inputs: Vec<SampleInput>,
    #[serde(default)]
    pub metric: MetricSpec,
    #[serde(default)]
    pub dynamic_info: Option<DynamicInfo>,
    #[serde(default = "default_pipeline_file")]
    pub pipeline_file: PathBuf,
    #[serde(default)]
    pub auxiliary_files: Vec<AuxiliaryFile>,
}

fn default_batch_size() -> usize {
    1
}

fn default_pipeline_file() -> PathBuf {
    PathBuf::from("pipeline.py")
}

#[derive(Clone, Debug)]
pub struct ManifestModel {
    root: PathBuf,
    pipeline_file: PathBuf,
    manifest: ModelManifest,
}

impl ManifestModel {
    /// Loads `<model_path>/model.json`; `model_path` may also point at the manifest itself.
    pub fn load(model_path: &Path) -> Result<Self> {
        let (root, manifest_path) = if model_path.is_dir() {
            (model_path.to_path_buf(), model_path.join(MANIFEST_FILENAME))
        } else {
            let root = model_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            (root, model_path.to_path_buf())
        };

        let raw = fs::read_to_string(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest: ModelManifest = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;
        Self::from_manifest(root, manifest)
    }

    pub fn from_manifest(root: PathBuf, manifest: ModelManifest) -> Result<Self> {
        ensure!(
            is_valid_model_name(&manifest.name),
            "model name `{}` is not usable as a directory name",
            manifest.name
        );
        ensure!(manifest.batch_size > 0, "batch_size must be greater than zero");
        ensure!(
            !manifest.sample_inputs.is_empty(),
            "at least one sample input is required"
        );
        for file in &manifest.auxiliary_files {
            ensure!(
                is_valid_model_name(&file.filename),
                "auxiliary file name `{}` must be a plain file name",
                file.filename
            );
        }

        let model_file = root.join(&manifest.model_file);
        ensure!(
            model_file.is_file(),
            "model file {} does not exist",
            model_file.display()
        );
        let pipeline_file = root.join(&manifest.pipeline_file);
        ensure!(
            pipeline_file.is_file(),
            "pipeline file {} does not exist",
            pipeline_file.display()
        );

        Ok(Self {
            root,
            pipeline_file,
            manifest,
        })
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }
}

impl ModelSource for ManifestModel {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn auxiliary_data(&self) -> bool {
        !self.manifest.auxiliary_files.is_empty()
    }

    fn optimizer_args(&self) -> Result<OptimizerArgs> {
        Ok(OptimizerArgs {
            model: self.root.join(&self.manifest.model_file),
            batch_size: self.manifest.batch_size,
            input_data: self.manifest.sample_inputs.clone(),
            metric: self.manifest.metric.metric.clone(),
            metric_drop_ths: self.manifest.metric.metric_drop_ths,
            optimization_time: self.manifest.optimization_time,
            dynamic_info: self.manifest.dynamic_info.clone(),
            ignore_compilers: Vec::new(),
        })
    }

    fn pipeline_file(&self) -> &Path {
        &self.pipeline_file
    }

    fn save_auxiliary_data(&self, dir: &Path) -> Result<()> {
        fetch_auxiliary_files(&self.manifest.auxiliary_files, &self.root, dir)
    }
}
