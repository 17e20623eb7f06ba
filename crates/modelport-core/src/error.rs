use std::path::PathBuf;

use thiserror::Error;

/// Malformed optimizer metadata or an invalid build parameter.
///
/// Every variant is fatal for a conversion run; nothing here is retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown engine kind: {0}")]
    UnknownEngineKind(String),

    #[error("unknown device kind: {0} (expected cpu or gpu)")]
    UnknownDeviceKind(String),

    #[error("unknown data type: {0} (expected int or float)")]
    UnknownDataType(String),

    #[error("dynamic axis {axis} is out of range for tensor `{tensor}` of rank {rank}")]
    AxisOutOfRange {
        tensor: String,
        axis: usize,
        rank: usize,
    },

    #[error("malformed model metadata: {0}")]
    MalformedMetadata(String),

    #[error("instance count must be greater than zero")]
    InvalidInstanceCount,

    #[error("optimizer output {dir} holds {count} candidate artifacts; name one via `artifact_filename`")]
    AmbiguousArtifact { dir: PathBuf, count: usize },

    #[error("optimizer output {0} holds no compiled artifact")]
    MissingArtifact(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
