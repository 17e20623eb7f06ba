mod cli;
mod registry;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use modelport_core::ConfigDocumentBuilder;
use modelport_runtime::{ConvertOptions, ModelRegistry, Orchestrator};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    std::env::set_var("RUST_LOG", &cli.log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let optimizer = registry::build_optimizer(&cli)?;
    let models = ModelRegistry::default();

    let opts = ConvertOptions {
        model_path: cli.model_path,
        model_kind: cli.model_kind,
        optimized_model_path: cli.optimized_model_path,
        triton_model_path: cli.triton_model_path,
        task: cli.task,
        ignore_compilers: cli.ignore_compilers,
        template_dir: cli.template_dir,
        config: ConfigDocumentBuilder::new(cli.instances, cli.device),
    };

    let report = Orchestrator::new(optimizer.as_ref(), &models)
        .run(&opts)
        .with_context(|| format!("failed to convert {}", opts.model_path.display()))?;

    tracing::info!(
        config = %report.config_name,
        optimized = %report.optimized_dir.display(),
        model = %report.model_dir.display(),
        pipeline = %report.pipeline_dir.display(),
        "model repository ready"
    );
    Ok(())
}
