use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// A file the pipeline stage needs next to its code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryFile {
    /// `http(s)://` URL, or a path relative to the model directory.
    #[serde(alias = "url")]
    pub source: String,
    pub filename: String,
}

impl AuxiliaryFile {
    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// Fetches each file into `dir`. The first failure aborts; nothing is retried.
pub fn fetch_auxiliary_files(files: &[AuxiliaryFile], model_dir: &Path, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build();

    for file in files {
        let dest = dir.join(&file.filename);
        if file.is_remote() {
            download(&agent, &file.source, &dest)?;
        } else {
            let src = model_dir.join(&file.source);
            fs::copy(&src, &dest)
                .with_context(|| format!("failed to copy auxiliary file {}", src.display()))?;
        }
        info!(file = %file.filename, source = %file.source, "auxiliary file saved");
    }
    Ok(())
}

fn download(agent: &ureq::Agent, url: &str, dest: &Path) -> Result<()> {
    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => bail!("GET {url} returned HTTP {status}"),
        Err(err) => return Err(err).with_context(|| format!("GET {url} failed")),
    };

    let mut file =
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let mut reader = response.into_reader();
    io::copy(&mut reader, &mut file).with_context(|| format!("failed to download {url}"))?;
    Ok(())
}
