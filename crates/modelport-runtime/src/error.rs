use std::path::PathBuf;

use modelport_core::ConfigError;
use modelport_pipeline::{TaskError, TemplateError};
use thiserror::Error;

/// Failure of a conversion run. Nothing is retried; every variant aborts.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("failed to load model description from {path}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("optimizer `{optimizer}` failed")]
    Optimizer {
        optimizer: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write {path}")]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to restore {path}; previous content kept at {retained}")]
    Restore {
        path: PathBuf,
        retained: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save auxiliary data for `{model}`")]
    AuxiliaryData {
        model: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ConvertError {
    pub(crate) fn layout(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ConvertError::Layout { path, source }
    }
}
