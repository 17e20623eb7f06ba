use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use modelport_core::DeviceKind;
use modelport_pipeline::Task;

#[derive(Parser, Debug)]
#[command(
    name = "modelport",
    version,
    about = "Optimize a model and generate an inference-server model repository"
)]
pub struct Cli {
    /// Directory holding the model description (model.json, pipeline.py)
    #[arg(long = "model_path")]
    pub model_path: PathBuf,

    /// Where the optimizer result is saved
    #[arg(long = "optimized_model_path")]
    pub optimized_model_path: PathBuf,

    /// Root of the generated model repository
    #[arg(long = "triton_model_path")]
    pub triton_model_path: PathBuf,

    /// Task the pipeline stage is generated for
    #[arg(long, value_parser = parse_task)]
    pub task: Task,

    /// Compilers the optimizer should skip (comma-separated)
    #[arg(long = "ignore_compilers", value_delimiter = ',')]
    pub ignore_compilers: Vec<String>,

    /// Optimizer backend
    #[arg(long, value_enum, default_value_t = OptimizerKind::Onnxruntime)]
    pub optimizer: OptimizerKind,

    /// External optimizer executable (with --optimizer exec)
    #[arg(long = "optimizer_program", required_if_eq("optimizer", "exec"))]
    pub optimizer_program: Option<PathBuf>,

    /// Directory with per-task template subdirectories (built-in templates otherwise)
    #[arg(long = "template_dir")]
    pub template_dir: Option<PathBuf>,

    /// Model description loader
    #[arg(long = "model_kind", default_value = "manifest")]
    pub model_kind: String,

    /// Model instances the server should run
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub instances: u32,

    /// Device kind for model instances (cpu or gpu)
    #[arg(long, default_value = "gpu", value_parser = parse_device)]
    pub device: DeviceKind,

    /// Log level (RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OptimizerKind {
    Onnxruntime,
    Exec,
}

fn parse_task(raw: &str) -> Result<Task, String> {
    raw.parse().map_err(|e: modelport_pipeline::TaskError| e.to_string())
}

fn parse_device(raw: &str) -> Result<DeviceKind, String> {
    raw.parse().map_err(|e: modelport_core::ConfigError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec![
            "modelport",
            "--model_path",
            "examples/resnet50",
            "--optimized_model_path",
            "out/optimized",
            "--triton_model_path",
            "out/triton",
        ];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn parses_required_flags_and_defaults() {
        let cli = parse(&["--task", "image_classification"]).unwrap();
        assert_eq!(cli.task, Task::ImageClassification);
        assert!(cli.ignore_compilers.is_empty());
        assert_eq!(cli.optimizer, OptimizerKind::Onnxruntime);
        assert_eq!(cli.instances, 1);
        assert_eq!(cli.device, DeviceKind::Gpu);
        assert_eq!(cli.model_kind, "manifest");
    }

    #[test]
    fn ignore_compilers_is_comma_separated() {
        let cli = parse(&[
            "--task",
            "image_classification",
            "--ignore_compilers",
            "tensor RT,onnxruntime",
        ])
        .unwrap();
        assert_eq!(cli.ignore_compilers, vec!["tensor RT", "onnxruntime"]);
    }

    #[test]
    fn unknown_task_and_device_are_rejected() {
        assert!(parse(&["--task", "speech"]).is_err());
        assert!(parse(&["--task", "image_classification", "--device", "tpu"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn text_classification_parses() {
        let cli = parse(&["--task", "text_classification"]).unwrap();
        assert_eq!(cli.task, Task::TextClassification);
    }

    #[test]
    fn exec_requires_a_program() {
        assert!(parse(&["--task", "image_classification", "--optimizer", "exec"]).is_err());
        let cli = parse(&[
            "--task",
            "image_classification",
            "--optimizer",
            "exec",
            "--optimizer_program",
            "/usr/local/bin/optimize",
        ])
        .unwrap();
        assert_eq!(cli.optimizer, OptimizerKind::Exec);
    }
}
