// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapter implementing the [`TileExecutor`] port.
//!
//! [`TileExecutor`]: crate::application::port::TileExecutor

use std::path::{Path, PathBuf};

use ndarray::{Array4, ArrayView4};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};

use crate::application::port::TileExecutor;
use crate::domain::tile::TensorShape;
use crate::error::{Error, Result};

/// Fixed-shape tile executor backed by an ONNX model.
///
/// The model must have exactly one input and one output, both `N x C x H x W`
/// `f32` tensors. The input shape is chosen by the caller; the output shape
/// is discovered by a probe inference at load time and fixed from then on.
///
/// # Example
///
/// ```ignore
/// use tilestitch::infrastructure::onnx::OnnxTileExecutor;
/// use tilestitch::config::RenderConfig;
///
/// let config = RenderConfig::default();
/// let executor = OnnxTileExecutor::load("models/2x.onnx", config.input_shape())?;
/// println!("{} -> {}", executor.input_shape(), executor.output_shape());
/// ```
pub struct OnnxTileExecutor {
    session: Session,
    model_path: PathBuf,
    name: String,
    input_name: String,
    input_shape: TensorShape,
    output_shape: TensorShape,
}

impl OnnxTileExecutor {
    /// Loads a model and validates it with a probe inference on a zero batch.
    ///
    /// # Errors
    ///
    /// - [`Error::ModelNotFound`] if `path` does not exist
    /// - [`Error::Configuration`] if the model does not have exactly one
    ///   input and one output
    /// - [`Error::Backend`] if the session cannot be created, the probe
    ///   fails, or the probe output is not a 4-D tensor
    pub fn load(path: impl AsRef<Path>, input_shape: TensorShape) -> Result<Self> {
        let model_path = path.as_ref().to_path_buf();
        if !model_path.exists() {
            return Err(Error::ModelNotFound(model_path));
        }

        let session = Session::builder()
            .map_err(backend)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(backend)?
            .commit_from_file(&model_path)
            .map_err(backend)?;

        if session.inputs().len() != 1 || session.outputs().len() != 1 {
            return Err(Error::Configuration(format!(
                "model must have 1 input and 1 output, found {} and {}",
                session.inputs().len(),
                session.outputs().len()
            )));
        }
        let input_name = session
            .inputs()
            .first()
            .map_or_else(|| "input".to_string(), |i| i.name().to_string());
        let name = model_path
            .file_stem()
            .map_or_else(|| "onnx".to_string(), |s| s.to_string_lossy().into_owned());

        let mut executor = Self {
            session,
            model_path,
            name,
            input_name,
            input_shape,
            output_shape: input_shape,
        };

        let probe = executor.run(Array4::<f32>::zeros(input_shape.dims()).view())?;
        let output_shape = TensorShape::from_dims(probe.shape())
            .map_err(|err| Error::Backend(format!("probe inference: {err}")))?;
        executor.output_shape = output_shape;

        tracing::info!(
            model = %executor.model_path.display(),
            input = %input_shape,
            output = %output_shape,
            "ONNX executor loaded"
        );
        Ok(executor)
    }

    /// Path the model was loaded from.
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn run(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        // Ensure standard layout for ONNX Runtime
        let batch = batch.as_standard_layout().into_owned();
        let input_ref = ort::value::TensorRef::from_array_view(&batch).map_err(backend)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_ref])
            .map_err(backend)?;
        extract_output(&outputs)
    }
}

impl TileExecutor for OnnxTileExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> TensorShape {
        self.input_shape
    }

    fn output_shape(&self) -> TensorShape {
        self.output_shape
    }

    fn infer(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        self.run(batch)
    }
}

fn backend<R>(err: ort::Error<R>) -> Error {
    Error::Backend(err.to_string())
}

/// Copies the first output tensor into an owned `N x C x H x W` array.
fn extract_output(outputs: &SessionOutputs<'_>) -> Result<Array4<f32>> {
    let (_, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| Error::Backend("model produced no output tensor".to_string()))?;

    let (shape, data) = output.try_extract_tensor::<f32>().map_err(backend)?;
    if shape.len() != 4 {
        return Err(Error::Backend(format!(
            "expected a 4-D output tensor, got {}-D",
            shape.len()
        )));
    }

    let mut dims = [0usize; 4];
    for (dim, &extent) in dims.iter_mut().zip(shape.iter()) {
        *dim = usize::try_from(extent)
            .map_err(|_| Error::Backend(format!("invalid output dimension {extent}")))?;
    }
    Array4::from_shape_vec(dims, data.to_vec()).map_err(|e| Error::Backend(e.to_string()))
}
