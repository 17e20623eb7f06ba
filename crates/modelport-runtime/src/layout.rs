//! Staged model-repository directories.
//!
//! Each output directory is assembled in a hidden sibling under the
//! repository root and swapped into place by [`commit_all`]. The previous
//! directory of the same name is moved aside first and removed once every
//! stage is in place, so a run replaces content rather than merging into
//! it, and a failed commit puts the previous content back.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use tracing::{debug, error};

use crate::ConvertError;

/// Name of the single version directory inside a model directory.
pub const VERSION_DIR: &str = "1";
pub const CONFIG_FILENAME: &str = "config.pbtxt";

pub struct StagedDir {
    staging: TempDir,
    target: PathBuf,
}

impl StagedDir {
    pub fn new(root: &Path, name: &str) -> Result<Self, ConvertError> {
        fs::create_dir_all(root).map_err(ConvertError::layout(root))?;
        let staging = Builder::new()
            .prefix(&format!(".{name}.staging-"))
            .tempdir_in(root)
            .map_err(ConvertError::layout(root))?;
        fs::create_dir(staging.path().join(VERSION_DIR))
            .map_err(ConvertError::layout(staging.path()))?;
        debug!(staging = %staging.path().display(), "staging directory created");

        Ok(Self {
            staging,
            target: root.join(name),
        })
    }

    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    pub fn version_dir(&self) -> PathBuf {
        self.path().join(VERSION_DIR)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write(&self, rel: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<(), ConvertError> {
        let dest = self.path().join(rel);
        fs::write(&dest, contents).map_err(ConvertError::layout(dest))
    }

    pub fn copy_in(&self, src: &Path, rel: impl AsRef<Path>) -> Result<(), ConvertError> {
        let dest = self.path().join(rel);
        fs::copy(src, &dest).map_err(ConvertError::layout(dest))?;
        Ok(())
    }

    /// Moves the staged content into `target`. The previous directory of
    /// the same name is held aside until [`Swapped::finish`] or
    /// [`Swapped::rollback`].
    pub fn swap(self) -> Result<Swapped, ConvertError> {
        let root = self
            .target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = self
            .target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let retired = Builder::new()
            .prefix(&format!(".{name}.retired-"))
            .tempdir_in(&root)
            .map_err(ConvertError::layout(&root))?;
        let previous = retired.path().join(&name);

        let had_previous = self.target.exists();
        if had_previous {
            fs::rename(&self.target, &previous).map_err(ConvertError::layout(&self.target))?;
        }
        let swapped = Swapped {
            target: self.target,
            retired,
            previous: had_previous.then_some(previous),
        };

        let staged = self.staging.keep();
        if let Err(source) = fs::rename(&staged, &swapped.target) {
            let _ = fs::remove_dir_all(&staged);
            error!(dir = %swapped.target.display(), %source, "staged directory could not be moved into place");
            let path = swapped.target.clone();
            swapped.put_back()?;
            return Err(ConvertError::Layout { path, source });
        }

        debug!(dir = %swapped.target.display(), replaced = had_previous, "directory swapped");
        Ok(swapped)
    }
}

/// A directory swapped into place whose previous content is still held.
pub struct Swapped {
    target: PathBuf,
    // Deleting this removes the previous content.
    retired: TempDir,
    previous: Option<PathBuf>,
}

impl Swapped {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Drops the previous content and returns the committed path.
    pub fn finish(self) -> PathBuf {
        debug!(dir = %self.target.display(), "directory committed");
        self.target
    }

    /// Removes the new content and moves the previous directory back.
    pub fn rollback(self) -> Result<(), ConvertError> {
        match fs::remove_dir_all(&self.target) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(self.retain(source)),
        }
        self.put_back()
    }

    fn put_back(self) -> Result<(), ConvertError> {
        let Some(previous) = &self.previous else {
            return Ok(());
        };
        match fs::rename(previous, &self.target) {
            Ok(()) => {
                debug!(dir = %self.target.display(), "previous directory restored");
                Ok(())
            }
            Err(source) => Err(self.retain(source)),
        }
    }

    // Keeps the previous content on disk and reports where it is.
    fn retain(self, source: io::Error) -> ConvertError {
        let Some(retained) = self.previous else {
            return ConvertError::Layout {
                path: self.target,
                source,
            };
        };
        let _ = self.retired.keep();
        error!(
            dir = %self.target.display(),
            retained = %retained.display(),
            %source,
            "previous directory could not be restored"
        );
        ConvertError::Restore {
            path: self.target,
            retained,
            source,
        }
    }
}

/// Swaps every stage into place, or none of them: when a later swap fails
/// the earlier ones are rolled back before the error is returned.
pub fn commit_all(stages: Vec<StagedDir>) -> Result<(), ConvertError> {
    let mut swapped: Vec<Swapped> = Vec::with_capacity(stages.len());
    for stage in stages {
        match stage.swap() {
            Ok(done) => swapped.push(done),
            Err(err) => {
                for done in swapped.into_iter().rev() {
                    if let Err(rollback) = done.rollback() {
                        error!(error = %rollback, "rollback failed");
                    }
                }
                return Err(err);
            }
        }
    }
    for done in swapped {
        done.finish();
    }
    Ok(())
}
