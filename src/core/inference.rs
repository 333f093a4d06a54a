//! ONNX Runtime session wrapper for the OCR pipeline.
//!
//! This module wraps an `ort` session behind a small typed interface: the
//! caller submits a `[N, 3, H, W]` batch and receives a tensor whose
//! dimensionality is checked at the boundary. Sessions are not assumed to be
//! thread-safe, so each one is serialized behind a mutex.

use crate::core::{
    batch::{Tensor2D, Tensor3D, Tensor4D},
    errors::OCRError,
};
use ort::{session::Session, value::Value};
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

/// A struct for performing inference using an ONNX Runtime model.
///
/// The detection model declares its input under the fixed name `"x"`; the
/// classification and recognition models are opened with whatever name their
/// first declared input carries.
#[derive(Debug)]
pub struct OrtInfer {
    /// The ONNX Runtime session.
    session: Mutex<Session>,
    /// The name of the input tensor.
    input_name: String,
}

impl OrtInfer {
    /// Creates a new OrtInfer instance with an explicit input tensor name.
    ///
    /// # Arguments
    ///
    /// * `model_path` - The path to the ONNX model file.
    /// * `input_name` - The name of the input tensor.
    ///
    /// # Returns
    ///
    /// A Result containing the new OrtInfer instance or an OCRError.
    pub fn new(model_path: impl AsRef<Path>, input_name: &str) -> Result<Self, OCRError> {
        let session = Session::builder()?.commit_from_file(model_path.as_ref())?;
        Ok(OrtInfer {
            session: Mutex::new(session),
            input_name: input_name.to_string(),
        })
    }

    /// Creates a new OrtInfer instance using the model's first declared input name.
    ///
    /// # Arguments
    ///
    /// * `model_path` - The path to the ONNX model file.
    ///
    /// # Returns
    ///
    /// A Result containing the new OrtInfer instance or an OCRError.
    pub fn with_first_input_name(model_path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let session = Session::builder()?.commit_from_file(model_path.as_ref())?;
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| OCRError::ConfigError {
                message: "model declares no inputs".to_string(),
            })?;
        Ok(OrtInfer {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Returns the input tensor name this session was opened with.
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Runs inference and hands the raw output shape and data to a processor closure.
    fn run_inference_with_processor<T>(
        &self,
        x: Tensor4D,
        processor: impl FnOnce(&[i64], &[f32]) -> Result<T, OCRError>,
    ) -> Result<T, OCRError> {
        let input_tensor = Value::from_array(x).map_err(OCRError::Session)?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];
        let mut session = self.session.lock().map_err(|_| OCRError::InvalidInput {
            message: "failed to acquire session lock".to_string(),
        })?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| OCRError::InvalidInput {
                message: "no outputs available in session".to_string(),
            })?;
        let outputs = session.run(inputs).map_err(OCRError::Session)?;
        let output = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(OCRError::Session)?;
        let (output_shape, output_data) = output;

        processor(output_shape, output_data)
    }

    /// Runs inference and returns the output as a 4D tensor.
    ///
    /// Used by the detection model, whose probability map must have shape
    /// `[N, 1, H, W]`. A mismatched shape is a hard error here: without the
    /// map there is nothing left for the request to do.
    ///
    /// # Arguments
    ///
    /// * `x` - The input tensor.
    ///
    /// # Returns
    ///
    /// A Result containing the output 4D tensor or an OCRError.
    pub fn infer_4d(&self, x: Tensor4D) -> Result<Tensor4D, OCRError> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.len() != 4 {
                return Err(OCRError::InvalidInput {
                    message: format!("expected 4D output tensor, got {}D", output_shape.len()),
                });
            }

            let dims = (
                output_shape[0] as usize,
                output_shape[1] as usize,
                output_shape[2] as usize,
                output_shape[3] as usize,
            );
            let expected_len = dims.0 * dims.1 * dims.2 * dims.3;
            if output_data.len() != expected_len {
                return Err(OCRError::InvalidInput {
                    message: format!(
                        "output data size mismatch: expected {}, got {}",
                        expected_len,
                        output_data.len()
                    ),
                });
            }

            let view = ndarray::ArrayView4::from_shape(dims, output_data).map_err(OCRError::Tensor)?;
            Ok(view.to_owned())
        })
    }

    /// Runs inference and returns the output as a 3D tensor, or `None` on a
    /// readback surprise.
    ///
    /// Used by the recognition model (`[N, T, V]`). An empty buffer or an
    /// unexpected shape is logged and reported as `None` so the caller can
    /// emit empty recognitions for the batch instead of aborting the request.
    ///
    /// # Arguments
    ///
    /// * `x` - The input tensor.
    ///
    /// # Returns
    ///
    /// A Result containing the output 3D tensor, `None` for a degenerate
    /// readback, or an OCRError for a runtime failure.
    pub fn infer_3d(&self, x: Tensor4D) -> Result<Option<Tensor3D>, OCRError> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.len() != 3 || output_data.is_empty() {
                warn!(
                    shape = ?output_shape,
                    len = output_data.len(),
                    "discarding recognition output with unexpected layout"
                );
                return Ok(None);
            }

            let dims = (
                output_shape[0] as usize,
                output_shape[1] as usize,
                output_shape[2] as usize,
            );
            if output_data.len() != dims.0 * dims.1 * dims.2 {
                warn!(
                    shape = ?output_shape,
                    len = output_data.len(),
                    "discarding recognition output with mismatched element count"
                );
                return Ok(None);
            }

            let view = ndarray::ArrayView3::from_shape(dims, output_data).map_err(OCRError::Tensor)?;
            Ok(Some(view.to_owned()))
        })
    }

    /// Runs inference and returns the output as a 2D tensor, or `None` on a
    /// readback surprise.
    ///
    /// Used by the angle classification model (`[N, 2]`). Like [`Self::infer_3d`],
    /// degenerate readbacks become `None` and the batch is treated as
    /// unclassified.
    ///
    /// # Arguments
    ///
    /// * `x` - The input tensor.
    ///
    /// # Returns
    ///
    /// A Result containing the output 2D tensor, `None` for a degenerate
    /// readback, or an OCRError for a runtime failure.
    pub fn infer_2d(&self, x: Tensor4D) -> Result<Option<Tensor2D>, OCRError> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.len() != 2 || output_data.is_empty() {
                warn!(
                    shape = ?output_shape,
                    len = output_data.len(),
                    "discarding classification output with unexpected layout"
                );
                return Ok(None);
            }

            let dims = (output_shape[0] as usize, output_shape[1] as usize);
            if output_data.len() != dims.0 * dims.1 {
                warn!(
                    shape = ?output_shape,
                    len = output_data.len(),
                    "discarding classification output with mismatched element count"
                );
                return Ok(None);
            }

            let view = ndarray::ArrayView2::from_shape(dims, output_data).map_err(OCRError::Tensor)?;
            Ok(Some(view.to_owned()))
        })
    }
}
