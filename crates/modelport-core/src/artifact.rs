use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{ConfigError, ConfigResult, ModelDescription};

/// Subdirectory the optimizer saves its result into.
pub const OPTIMIZED_MODEL_DIR: &str = "optimized_model";
pub const METADATA_FILENAME: &str = "metadata.json";

/// A saved optimizer result: metadata plus the compiled artifact on disk.
#[derive(Clone, Debug)]
pub struct OptimizerOutput {
    pub dir: PathBuf,
    pub metadata: ModelDescription,
    pub artifact: PathBuf,
}

impl OptimizerOutput {
    /// Reads `<saved_path>/optimized_model/metadata.json` and locates the artifact.
    pub fn read(saved_path: &Path) -> ConfigResult<Self> {
        let dir = saved_path.join(OPTIMIZED_MODEL_DIR);
        let metadata_path = dir.join(METADATA_FILENAME);

        let raw = fs::read_to_string(&metadata_path).map_err(|source| ConfigError::Io {
            path: metadata_path.clone(),
            source,
        })?;
        let metadata = ModelDescription::from_json(&raw).map_err(|source| ConfigError::Json {
            path: metadata_path.clone(),
            source,
        })?;

        let artifact = select_artifact(&dir, metadata.artifact_filename.as_deref())?;
        Ok(Self {
            dir,
            metadata,
            artifact,
        })
    }
}

/// Writes `metadata` plus a copy of `artifact` into `<path>/optimized_model/`,
/// naming the artifact in the metadata. Returns the output directory.
pub fn write_optimizer_output(
    path: &Path,
    metadata: &ModelDescription,
    artifact: &Path,
) -> anyhow::Result<PathBuf> {
    let file_name = artifact
        .file_name()
        .and_then(|f| f.to_str())
        .with_context(|| format!("artifact path {} has no file name", artifact.display()))?;
    anyhow::ensure!(
        file_name != METADATA_FILENAME,
        "artifact may not be named {METADATA_FILENAME}"
    );

    let dir = path.join(OPTIMIZED_MODEL_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut metadata = metadata.clone();
    metadata.artifact_filename = Some(file_name.to_string());
    let raw = serde_json::to_string_pretty(&metadata).context("failed to encode metadata")?;
    fs::write(dir.join(METADATA_FILENAME), raw)
        .with_context(|| format!("failed to write metadata into {}", dir.display()))?;

    fs::copy(artifact, dir.join(file_name))
        .with_context(|| format!("failed to copy {}", artifact.display()))?;
    Ok(dir)
}

/// Picks the compiled artifact inside an optimizer output directory.
///
/// A name given in metadata wins. Otherwise the directory must hold
/// exactly one regular file besides `metadata.json`.
pub fn select_artifact(dir: &Path, named: Option<&str>) -> ConfigResult<PathBuf> {
    if let Some(name) = named {
        let is_plain = Path::new(name)
            .file_name()
            .is_some_and(|f| f == std::ffi::OsStr::new(name));
        if !is_plain || name == METADATA_FILENAME {
            return Err(ConfigError::MalformedMetadata(format!(
                "artifact_filename `{name}` is not a plain artifact file name"
            )));
        }
        let path = dir.join(name);
        if !path.is_file() {
            return Err(ConfigError::MissingArtifact(path));
        }
        return Ok(path);
    }

    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && entry.file_name() != METADATA_FILENAME {
            candidates.push(path);
        }
    }

    match candidates.len() {
        0 => Err(ConfigError::MissingArtifact(dir.to_path_buf())),
        1 => Ok(candidates.remove(0)),
        count => Err(ConfigError::AmbiguousArtifact {
            dir: dir.to_path_buf(),
            count,
        }),
    }
}
