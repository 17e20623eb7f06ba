//! Runs an external optimizer executable.
//!
//! The program is invoked as
//!
//! ```text
//! <program> [extra args...] --args <optimizer_args.json> --output <dir>
//! ```
//!
//! and must leave `<dir>/optimized_model/metadata.json` plus the compiled
//! artifact behind, exiting with status 0.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{ensure, Context, Result};
use modelport_core::{OptimizedModel, Optimizer, OptimizerArgs, METADATA_FILENAME, OPTIMIZED_MODEL_DIR};
use tempfile::TempDir;
use tracing::{debug, info};

const ARGS_FILENAME: &str = "optimizer_args.json";

pub struct ExecOptimizer {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl ExecOptimizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}

pub struct ExecOptimized {
    staging: TempDir,
}

impl Optimizer for ExecOptimizer {
    fn name(&self) -> &'static str {
        "exec"
    }

    fn optimize(&self, args: &OptimizerArgs) -> Result<Box<dyn OptimizedModel>> {
        let staging = tempfile::tempdir().context("failed to create staging directory")?;
        let args_path = staging.path().join(ARGS_FILENAME);
        let encoded = serde_json::to_vec_pretty(args).context("failed to encode optimizer args")?;
        fs::write(&args_path, encoded)
            .with_context(|| format!("failed to write {}", args_path.display()))?;

        let output_dir = staging.path().join("out");
        fs::create_dir(&output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        info!(program = %self.program.display(), model = %args.model.display(), "running external optimizer");
        let status = Command::new(&self.program)
            .args(&self.extra_args)
            .arg("--args")
            .arg(&args_path)
            .arg("--output")
            .arg(&output_dir)
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("failed to start optimizer {}", self.program.display()))?;
        ensure!(
            status.success(),
            "optimizer {} exited with {status}",
            self.program.display()
        );

        let metadata = output_dir.join(OPTIMIZED_MODEL_DIR).join(METADATA_FILENAME);
        ensure!(
            metadata.is_file(),
            "optimizer {} produced no {}",
            self.program.display(),
            metadata.display()
        );
        debug!(output = %output_dir.display(), "external optimizer finished");

        Ok(Box::new(ExecOptimized { staging }))
    }
}

impl OptimizedModel for ExecOptimized {
    fn save(&self, path: &Path) -> Result<()> {
        let src = self.staging.path().join("out").join(OPTIMIZED_MODEL_DIR);
        let dest = path.join(OPTIMIZED_MODEL_DIR);
        if dest.exists() {
            fs::remove_dir_all(&dest)
                .with_context(|| format!("failed to clear {}", dest.display()))?;
        }
        copy_dir(&src, &dest)
    }
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("failed to read {}", src.display()))? {
        let entry = entry?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to).with_context(|| format!("failed to copy {}", from.display()))?;
        }
    }
    Ok(())
}
