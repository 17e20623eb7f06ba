//! One conversion run: optimize a model and materialize its serving layout.
//!
//! ```text
//! <triton_root>/<model>_<engine>/config.pbtxt
//! <triton_root>/<model>_<engine>/1/model.bin
//! <triton_root>/<model>_pipeline/config.pbtxt
//! <triton_root>/<model>_pipeline/1/{model.py, pipeline.py, auxiliary files...}
//! ```
//!
//! Both directories are staged and only swapped into place after every
//! stage has succeeded. Runs are strictly sequential and assume exclusive
//! ownership of the output root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use modelport_core::{
    ConfigDocumentBuilder, Optimizer, OptimizerOutput, DEFAULT_ARTIFACT_FILENAME,
};
use modelport_pipeline::{compose, Task, TemplateSource};
use tracing::{error, info};

use crate::{
    commit_all, is_valid_model_name, ConvertError, ModelRegistry, ModelSource, StagedDir, CONFIG_FILENAME,
    VERSION_DIR,
};

pub const PIPELINE_CODE_FILENAME: &str = "model.py";
pub const PIPELINE_LOGIC_FILENAME: &str = "pipeline.py";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loading,
    Optimizing,
    ConfiguringModel,
    ConfiguringPipeline,
    MaterializingLayout,
    Done,
    Failed,
}

#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub model_path: PathBuf,
    pub model_kind: String,
    pub optimized_model_path: PathBuf,
    pub triton_model_path: PathBuf,
    pub task: Task,
    pub ignore_compilers: Vec<String>,
    pub template_dir: Option<PathBuf>,
    pub config: ConfigDocumentBuilder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionReport {
    pub config_name: String,
    pub optimized_dir: PathBuf,
    pub model_dir: PathBuf,
    pub pipeline_dir: PathBuf,
}

pub struct Orchestrator<'a> {
    optimizer: &'a dyn Optimizer,
    registry: &'a ModelRegistry,
    stage: Stage,
}

impl<'a> Orchestrator<'a> {
    pub fn new(optimizer: &'a dyn Optimizer, registry: &'a ModelRegistry) -> Self {
        Self {
            optimizer,
            registry,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Loads the model through the registry, then converts it.
    pub fn run(&mut self, opts: &ConvertOptions) -> Result<ConversionReport, ConvertError> {
        let result = self.try_run(opts);
        self.finish(result)
    }

    /// Converts an already constructed model description.
    pub fn run_with_model(
        &mut self,
        model: &dyn ModelSource,
        opts: &ConvertOptions,
    ) -> Result<ConversionReport, ConvertError> {
        let result = self.try_run_with_model(model, opts);
        self.finish(result)
    }

    fn try_run(&mut self, opts: &ConvertOptions) -> Result<ConversionReport, ConvertError> {
        self.check_task(opts)?;
        let model = self.registry.load(&opts.model_kind, &opts.model_path)?;
        self.check_model(model.as_ref(), opts)?;
        self.convert(model.as_ref(), opts)
    }

    fn try_run_with_model(
        &mut self,
        model: &dyn ModelSource,
        opts: &ConvertOptions,
    ) -> Result<ConversionReport, ConvertError> {
        self.check_task(opts)?;
        self.check_model(model, opts)?;
        self.convert(model, opts)
    }

    fn finish(
        &mut self,
        result: Result<ConversionReport, ConvertError>,
    ) -> Result<ConversionReport, ConvertError> {
        match &result {
            Ok(report) => {
                self.enter(Stage::Done);
                info!(
                    model_dir = %report.model_dir.display(),
                    pipeline_dir = %report.pipeline_dir.display(),
                    "conversion finished"
                );
            }
            Err(err) => {
                error!(stage = ?self.stage, error = %err, "conversion failed");
                self.stage = Stage::Failed;
            }
        }
        result
    }

    fn enter(&mut self, stage: Stage) {
        info!(?stage, "entering stage");
        self.stage = stage;
    }

    // Runs before anything touches the filesystem.
    fn check_task(&mut self, opts: &ConvertOptions) -> Result<(), ConvertError> {
        self.enter(Stage::Loading);
        opts.task.ensure_supported()?;
        Ok(())
    }

    fn check_model(&self, model: &dyn ModelSource, opts: &ConvertOptions) -> Result<(), ConvertError> {
        if is_valid_model_name(model.name()) {
            return Ok(());
        }
        Err(ConvertError::ModelLoad {
            path: opts.model_path.clone(),
            source: anyhow!("model name `{}` is not a plain directory name", model.name()),
        })
    }

    fn convert(
        &mut self,
        model: &dyn ModelSource,
        opts: &ConvertOptions,
    ) -> Result<ConversionReport, ConvertError> {
        let name = model.name();
        let triton_root = &opts.triton_model_path;

        self.enter(Stage::Optimizing);
        let mut args = model
            .optimizer_args()
            .map_err(|source| ConvertError::ModelLoad {
                path: opts.model_path.clone(),
                source,
            })?;
        args.ignore_compilers = opts.ignore_compilers.clone();

        let optimizer = self.optimizer;
        let optimizer_err = |source| ConvertError::Optimizer {
            optimizer: optimizer.name(),
            source,
        };
        let optimized = optimizer.optimize(&args).map_err(optimizer_err)?;
        let optimized_dir = opts.optimized_model_path.join(name);
        fs::create_dir_all(&optimized_dir).map_err(ConvertError::layout(&optimized_dir))?;
        optimized.save(&optimized_dir).map_err(optimizer_err)?;
        info!(
            path = %optimized_dir.display(),
            optimizer = optimizer.name(),
            "optimized model saved"
        );

        self.enter(Stage::ConfiguringModel);
        let output = OptimizerOutput::read(&optimized_dir)?;
        let config = opts.config.build(&output.metadata, name)?;
        let model_stage = StagedDir::new(triton_root, &config.name)?;
        model_stage.write(CONFIG_FILENAME, config.to_pbtxt())?;
        model_stage.copy_in(
            &output.artifact,
            Path::new(VERSION_DIR).join(DEFAULT_ARTIFACT_FILENAME),
        )?;
        info!(config = %config.name, platform = %config.platform, "model config generated");

        self.enter(Stage::ConfiguringPipeline);
        let pipeline_name = format!("{name}_pipeline");
        let bindings = opts
            .task
            .bindings(&pipeline_name, &config.name, &output.metadata)?;
        let source = TemplateSource::for_task(opts.task, opts.template_dir.clone());
        let pipeline = compose(&source, &bindings.config, &bindings.code)?;
        let pipeline_stage = StagedDir::new(triton_root, &pipeline_name)?;
        pipeline_stage.write(CONFIG_FILENAME, &pipeline.configuration_text)?;
        pipeline_stage.write(
            Path::new(VERSION_DIR).join(PIPELINE_CODE_FILENAME),
            &pipeline.generated_code_text,
        )?;

        self.enter(Stage::MaterializingLayout);
        pipeline_stage.copy_in(
            model.pipeline_file(),
            Path::new(VERSION_DIR).join(PIPELINE_LOGIC_FILENAME),
        )?;
        if model.auxiliary_data() {
            model
                .save_auxiliary_data(&pipeline_stage.version_dir())
                .map_err(|source| ConvertError::AuxiliaryData {
                    model: name.to_string(),
                    source,
                })?;
        }

        let model_dir = model_stage.target().to_path_buf();
        let pipeline_dir = pipeline_stage.target().to_path_buf();
        commit_all(vec![model_stage, pipeline_stage])?;

        Ok(ConversionReport {
            config_name: config.name,
            optimized_dir,
            model_dir,
            pipeline_dir,
        })
    }
}
