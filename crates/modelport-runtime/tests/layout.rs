use std::fs;
use std::path::Path;

use anyhow::Result;
use modelport_runtime::{commit_all, ConvertError, StagedDir, CONFIG_FILENAME};
use tempfile::TempDir;

fn seed(root: &Path, name: &str, contents: &str) -> Result<()> {
    fs::create_dir_all(root.join(name))?;
    fs::write(root.join(name).join(CONFIG_FILENAME), contents)?;
    Ok(())
}

fn config(root: &Path, name: &str) -> Result<String> {
    Ok(fs::read_to_string(root.join(name).join(CONFIG_FILENAME))?)
}

fn entries(root: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(root)?
        .map(|e| Ok(e?.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

#[test]
fn all_stages_replace_previous_content() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = tmp.path();
    seed(root, "m_tensorrt", "old model")?;

    let model = StagedDir::new(root, "m_tensorrt")?;
    model.write(CONFIG_FILENAME, "new model")?;
    let pipeline = StagedDir::new(root, "m_pipeline")?;
    pipeline.write(CONFIG_FILENAME, "new pipeline")?;
    commit_all(vec![model, pipeline])?;

    assert_eq!(config(root, "m_tensorrt")?, "new model");
    assert_eq!(config(root, "m_pipeline")?, "new pipeline");
    assert_eq!(entries(root)?, ["m_pipeline", "m_tensorrt"]);
    Ok(())
}

#[test]
fn failed_second_swap_rolls_back_the_first() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = tmp.path();
    seed(root, "m_tensorrt", "old model")?;
    seed(root, "m_pipeline", "old pipeline")?;

    let model = StagedDir::new(root, "m_tensorrt")?;
    model.write(CONFIG_FILENAME, "new model")?;
    let pipeline = StagedDir::new(root, "m_pipeline")?;
    pipeline.write(CONFIG_FILENAME, "new pipeline")?;
    // With its staged content gone the pipeline cannot be moved into place.
    fs::remove_dir_all(pipeline.path())?;

    let err = commit_all(vec![model, pipeline]).unwrap_err();
    match err {
        ConvertError::Layout { path, .. } => assert_eq!(path, root.join("m_pipeline")),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(config(root, "m_tensorrt")?, "old model");
    assert_eq!(config(root, "m_pipeline")?, "old pipeline");
    assert_eq!(entries(root)?, ["m_pipeline", "m_tensorrt"]);
    Ok(())
}
