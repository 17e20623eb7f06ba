use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use modelport_core::{
    write_optimizer_output, DynamicAxes, DynamicInfo, InputInfo, ModelDescription,
    NetworkParameters, OptimizedModel, Optimizer, OptimizerArgs,
};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    tensor::TensorElementType,
    value::ValueType,
};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Module kind reported in metadata; the `onnx` suffix selects the
/// ONNX Runtime serving platform.
pub const MODULE_KIND: &str = "modelport.optimizers.onnxruntime.onnx";
const OPTIMIZED_FILENAME: &str = "model_optimized.onnx";

/// Applies ONNX Runtime's offline graph optimizations to an ONNX model.
pub struct OrtOptimizer;

impl OrtOptimizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OrtOptimized {
    // Keeps the optimized graph alive until saved.
    _staging: TempDir,
    artifact: std::path::PathBuf,
    metadata: ModelDescription,
}

impl Optimizer for OrtOptimizer {
    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn optimize(&self, args: &OptimizerArgs) -> Result<Box<dyn OptimizedModel>> {
        ensure!(
            !args.ignore_compilers.iter().any(|c| is_onnxruntime(c)),
            "onnxruntime is the only compiler of this optimizer and cannot be ignored"
        );
        ensure!(
            args.model.extension().is_some_and(|e| e == "onnx"),
            "onnxruntime optimizer expects an .onnx model, got {}",
            args.model.display()
        );
        if args.metric_drop_ths > 0.0 {
            warn!(
                metric = %args.metric,
                threshold = args.metric_drop_ths,
                "graph optimization is lossless; accuracy threshold ignored"
            );
        }

        let staging = tempfile::tempdir().context("failed to create staging directory")?;
        let artifact = staging.path().join(OPTIMIZED_FILENAME);
        let artifact_str = artifact
            .to_str()
            .context("staging path is not valid UTF-8")?;

        let session = Session::builder()
            .context("failed to create ORT session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("failed to configure ORT session builder")?
            .with_optimized_model_path(artifact_str)
            .context("failed to configure optimized model output")?
            .commit_from_file(&args.model)
            .context("failed to load ONNX model")?;
        ensure!(
            artifact.is_file(),
            "ONNX Runtime did not write an optimized model"
        );

        let inputs = session
            .inputs
            .iter()
            .map(|input| io_layout(&input.name, &input.input_type))
            .collect::<Result<Vec<_>>>()?;
        let outputs = session
            .outputs
            .iter()
            .map(|output| io_layout(&output.name, &output.output_type))
            .collect::<Result<Vec<_>>>()?;

        let metadata = build_metadata(&inputs, &outputs, args)?;
        info!(
            model = %args.model.display(),
            inputs = inputs.len(),
            outputs = outputs.len(),
            "ONNX graph optimized"
        );

        Ok(Box::new(OrtOptimized {
            _staging: staging,
            artifact,
            metadata,
        }))
    }
}

impl OptimizedModel for OrtOptimized {
    fn save(&self, path: &Path) -> Result<()> {
        write_optimizer_output(path, &self.metadata, &self.artifact)?;
        Ok(())
    }
}

fn is_onnxruntime(name: &str) -> bool {
    let folded: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    folded == "onnxruntime" || folded == "onnx"
}

/// Declared name, element kind and extents of one graph input or output.
#[derive(Clone, Debug, PartialEq)]
struct IoLayout {
    name: String,
    dtype: &'static str,
    dims: Vec<Option<usize>>, // None = dynamic
}

fn io_layout(name: &str, value_type: &ValueType) -> Result<IoLayout> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        bail!("unsupported non-tensor IO value type for `{name}`");
    };
    let dims = shape
        .iter()
        .map(|d| if *d < 0 { None } else { Some(*d as usize) })
        .collect::<Vec<_>>();

    Ok(IoLayout {
        name: name.to_string(),
        dtype: declared_dtype(name, *ty)?,
        dims,
    })
}

// Serving configs declare only INT32 and FP32, so wider or narrower
// element types cannot be described without changing the graph.
fn declared_dtype(name: &str, ty: TensorElementType) -> Result<&'static str> {
    match ty {
        TensorElementType::Float32 => Ok("float"),
        TensorElementType::Int32 => Ok("int"),
        _ => bail!(
            "tensor `{name}` has element type {ty}; only int32 and float32 IO can be served, \
             export the model with int32/float32 inputs and outputs"
        ),
    }
}

fn build_metadata(
    inputs: &[IoLayout],
    outputs: &[IoLayout],
    args: &OptimizerArgs,
) -> Result<ModelDescription> {
    let mut input_infos = Vec::with_capacity(inputs.len());
    for (index, io) in inputs.iter().enumerate() {
        let sample = args.input_data.get(index).map(|s| s.shape.as_slice());
        input_infos.push(InputInfo {
            size: static_size(io, sample)?,
            dtype: io.dtype.to_string(),
        });
    }
    let output_sizes = outputs
        .iter()
        .map(|io| static_size(io, None))
        .collect::<Result<Vec<_>>>()?;

    let dynamic_info = match &args.dynamic_info {
        Some(declared) => {
            ensure!(
                declared.inputs.len() == inputs.len() && declared.outputs.len() == outputs.len(),
                "dynamic_info covers {}/{} tensors, graph has {}/{}",
                declared.inputs.len(),
                declared.outputs.len(),
                inputs.len(),
                outputs.len()
            );
            Some(declared.clone())
        }
        None => graph_dynamic_info(inputs, outputs),
    };
    debug!(?dynamic_info, "dynamic axes");

    Ok(ModelDescription {
        module_kind: MODULE_KIND.to_string(),
        input_names: inputs.iter().map(|io| io.name.clone()).collect(),
        output_names: outputs.iter().map(|io| io.name.clone()).collect(),
        network_parameters: NetworkParameters {
            batch_size: args.batch_size,
            input_infos,
            output_sizes,
            dynamic_info,
        },
        artifact_filename: None,
    })
}

/// Non-batch extents. Dynamic extents take the sample shape when known, else 1.
fn static_size(io: &IoLayout, sample: Option<&[usize]>) -> Result<Vec<usize>> {
    ensure!(
        !io.dims.is_empty(),
        "tensor `{}` is a scalar; a leading batch axis is required",
        io.name
    );
    Ok(io.dims[1..]
        .iter()
        .enumerate()
        .map(|(i, d)| match d {
            Some(d) if *d > 0 => *d,
            _ => sample.and_then(|s| s.get(i).copied()).unwrap_or(1),
        })
        .collect())
}

fn graph_dynamic_info(inputs: &[IoLayout], outputs: &[IoLayout]) -> Option<DynamicInfo> {
    let axes = |io: &IoLayout| -> DynamicAxes {
        io.dims
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_none())
            .map(|(axis, _)| {
                let label = if axis == 0 {
                    "batch".to_string()
                } else {
                    format!("dim_{axis}")
                };
                (axis, label)
            })
            .collect()
    };

    let info = DynamicInfo {
        inputs: inputs.iter().map(axes).collect(),
        outputs: outputs.iter().map(axes).collect(),
    };
    let any_dynamic = info.inputs.iter().chain(&info.outputs).any(|a| !a.is_empty());
    any_dynamic.then_some(info)
}
