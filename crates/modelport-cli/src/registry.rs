use anyhow::{Context, Result};
use modelport_core::Optimizer;
use modelport_optimizer_exec::ExecOptimizer;
use modelport_optimizer_ort::OrtOptimizer;

use crate::cli::{Cli, OptimizerKind};

pub fn build_optimizer(cli: &Cli) -> Result<Box<dyn Optimizer>> {
    let optimizer: Box<dyn Optimizer> = match cli.optimizer {
        OptimizerKind::Onnxruntime => Box::new(OrtOptimizer::new()),
        OptimizerKind::Exec => {
            let program = cli
                .optimizer_program
                .clone()
                .context("--optimizer exec needs --optimizer_program")?;
            Box::new(ExecOptimizer::new(program))
        }
    };
    tracing::debug!(optimizer = optimizer.name(), "optimizer selected");
    Ok(optimizer)
}
