use std::fs;

use anyhow::Result;
use modelport_core::{
    select_artifact, ConfigError, OptimizerOutput, METADATA_FILENAME, OPTIMIZED_MODEL_DIR,
};
use tempfile::TempDir;

const METADATA: &str = r#"{
    "module_kind": "nebullvm.operations.inference_learners.onnx",
    "input_names": ["input_0"],
    "output_names": ["output_0"],
    "network_parameters": {
        "batch_size": 1,
        "input_infos": [{"size": [3, 32, 32], "dtype": "float"}],
        "output_sizes": [[10]],
        "dynamic_info": null
    }
}"#;

fn optimizer_dir(tmp: &TempDir) -> Result<std::path::PathBuf> {
    let dir = tmp.path().join(OPTIMIZED_MODEL_DIR);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(METADATA_FILENAME), METADATA)?;
    Ok(dir)
}

#[test]
fn reads_metadata_and_single_artifact() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = optimizer_dir(&tmp)?;
    fs::write(dir.join("model_optimized.onnx"), b"onnx bytes")?;

    let output = OptimizerOutput::read(tmp.path())?;
    assert_eq!(output.dir, dir);
    assert_eq!(output.artifact, dir.join("model_optimized.onnx"));
    assert_eq!(output.metadata.input_names, vec!["input_0".to_string()]);
    Ok(())
}

#[test]
fn more_than_one_candidate_is_ambiguous() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = optimizer_dir(&tmp)?;
    fs::write(dir.join("a.plan"), b"a")?;
    fs::write(dir.join("b.plan"), b"b")?;

    match select_artifact(&dir, None) {
        Err(ConfigError::AmbiguousArtifact { count, .. }) => assert_eq!(count, 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
    Ok(())
}

#[test]
fn named_artifact_resolves_ambiguity() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = optimizer_dir(&tmp)?;
    fs::write(dir.join("engine.plan"), b"a")?;
    fs::write(dir.join("calibration.cache"), b"b")?;

    let picked = select_artifact(&dir, Some("engine.plan"))?;
    assert_eq!(picked, dir.join("engine.plan"));

    assert!(matches!(
        select_artifact(&dir, Some("missing.plan")),
        Err(ConfigError::MissingArtifact(_))
    ));
    assert!(matches!(
        select_artifact(&dir, Some("../engine.plan")),
        Err(ConfigError::MalformedMetadata(_))
    ));
    Ok(())
}

#[test]
fn metadata_only_has_no_artifact() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = optimizer_dir(&tmp)?;
    fs::create_dir(dir.join("nested"))?;

    assert!(matches!(
        select_artifact(&dir, None),
        Err(ConfigError::MissingArtifact(_))
    ));
    Ok(())
}

#[test]
fn missing_metadata_is_io_error() -> Result<()> {
    let tmp = TempDir::new()?;
    assert!(matches!(
        OptimizerOutput::read(tmp.path()),
        Err(ConfigError::Io { .. })
    ));
    Ok(())
}

#[test]
fn written_output_reads_back() -> Result<()> {
    let tmp = TempDir::new()?;
    let source = tmp.path().join("model.onnx");
    fs::write(&source, b"graph")?;
    let metadata = modelport_core::ModelDescription::from_json(METADATA)?;

    let saved = tmp.path().join("saved");
    let dir = modelport_core::write_optimizer_output(&saved, &metadata, &source)?;
    // a stray file does not matter once the artifact is named
    fs::write(dir.join("optimizer.log"), b"log")?;

    let output = OptimizerOutput::read(&saved)?;
    assert_eq!(output.artifact, dir.join("model.onnx"));
    assert_eq!(output.metadata.artifact_filename.as_deref(), Some("model.onnx"));
    assert_eq!(fs::read(&output.artifact)?, b"graph");
    Ok(())
}
