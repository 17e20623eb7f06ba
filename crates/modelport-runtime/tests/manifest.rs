use std::fs;
use std::path::Path;

use anyhow::Result;
use modelport_core::OptimizationTime;
use modelport_runtime::{ConvertError, ManifestModel, ModelRegistry, ModelSource, MANIFEST_KIND};
use tempfile::TempDir;

fn model_dir(tmp: &TempDir, manifest: &str) -> Result<std::path::PathBuf> {
    let dir = tmp.path().join("resnet50_dynamic");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("model.json"), manifest)?;
    fs::write(dir.join("resnet50.onnx"), b"onnx")?;
    fs::write(dir.join("pipeline.py"), "class Pipeline: ...\n")?;
    fs::write(dir.join("imagenet_classes.txt"), "tench\n")?;
    Ok(dir)
}

const MANIFEST: &str = r#"{
    "name": "ResNet50_Dynamic",
    "model_file": "resnet50.onnx",
    "sample_inputs": [{"shape": [3, 224, 224]}],
    "dynamic_info": {
        "inputs": [{"0": "batch", "2": "height", "3": "width"}],
        "outputs": [{"0": "batch"}]
    },
    "auxiliary_files": [
        {"url": "imagenet_classes.txt", "filename": "labels.txt"}
    ]
}"#;

#[test]
fn manifest_defaults_and_optimizer_args() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = model_dir(&tmp, MANIFEST)?;

    let model = ManifestModel::load(&dir)?;
    assert_eq!(model.name(), "ResNet50_Dynamic");
    assert!(model.auxiliary_data());
    assert_eq!(model.pipeline_file(), dir.join("pipeline.py"));

    let args = model.optimizer_args()?;
    assert_eq!(args.model, dir.join("resnet50.onnx"));
    assert_eq!(args.batch_size, 1);
    assert_eq!(args.input_data[0].shape, vec![3, 224, 224]);
    assert_eq!(args.input_data[0].dtype, "float");
    assert_eq!(args.metric, "numeric_precision");
    assert_eq!(args.metric_drop_ths, 0.0);
    assert_eq!(args.optimization_time, OptimizationTime::Constrained);
    let dynamic = args.dynamic_info.expect("dynamic info");
    assert_eq!(dynamic.inputs[0].len(), 3);
    Ok(())
}

#[test]
fn manifest_path_may_name_the_file() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = model_dir(&tmp, MANIFEST)?;
    let model = ManifestModel::load(&dir.join("model.json"))?;
    assert_eq!(model.pipeline_file(), dir.join("pipeline.py"));
    Ok(())
}

#[test]
fn local_auxiliary_files_are_copied() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = model_dir(&tmp, MANIFEST)?;
    let out = tmp.path().join("out");

    ManifestModel::load(&dir)?.save_auxiliary_data(&out)?;
    assert_eq!(fs::read_to_string(out.join("labels.txt"))?, "tench\n");
    Ok(())
}

#[test]
fn missing_pipeline_file_fails_to_load() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = model_dir(&tmp, MANIFEST)?;
    fs::remove_file(dir.join("pipeline.py"))?;

    let err = ManifestModel::load(&dir).unwrap_err();
    assert!(err.to_string().contains("pipeline file"));
    Ok(())
}

#[test]
fn auxiliary_file_names_must_be_plain() -> Result<()> {
    let tmp = TempDir::new()?;
    let manifest = MANIFEST.replace("\"labels.txt\"", "\"../labels.txt\"");
    let dir = model_dir(&tmp, &manifest)?;
    assert!(ManifestModel::load(&dir).is_err());
    Ok(())
}

#[test]
fn registry_loads_manifest_models() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = model_dir(&tmp, MANIFEST)?;

    let registry = ModelRegistry::default();
    assert_eq!(registry.kinds(), vec![MANIFEST_KIND]);
    let model = registry.load(MANIFEST_KIND, &dir)?;
    assert_eq!(model.name(), "ResNet50_Dynamic");

    let err = match registry.load(MANIFEST_KIND, Path::new("/nonexistent/model")) {
        Ok(_) => panic!("loaded a model from a missing directory"),
        Err(err) => err,
    };
    assert!(matches!(err, ConvertError::ModelLoad { .. }));
    Ok(())
}

#[test]
fn registry_accepts_custom_factories() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = model_dir(&tmp, MANIFEST)?;

    let mut registry = ModelRegistry::new();
    registry.register("resnet", |path| {
        let model = ManifestModel::load(path)?;
        Ok(Box::new(model) as Box<dyn ModelSource>)
    });
    assert!(registry.load("resnet", &dir).is_ok());
    assert!(registry.load(MANIFEST_KIND, &dir).is_err());
    Ok(())
}
