//! DB (Differentiable Binarization) text detector.
//!
//! This module implements the text detection predictor: aspect-preserving
//! resize with side-length legalization, one forward pass through the
//! detection model, and DB post-processing from probability map to oriented
//! text boxes in original-image coordinates.

use crate::core::{constants, OCRError, OrtInfer, Tensor4D};
use crate::processors::{
    sort_reading_order, DBPostProcess, DetResize, NormalizeImage, TextBox,
};
use image::RgbaImage;
use ndarray::Axis;
use std::path::Path;
use tracing::debug;

/// The detection model declares its input under this fixed name.
const DET_INPUT_NAME: &str = "x";

/// Text detection predictor.
#[derive(Debug)]
pub struct TextDetector {
    resize: DetResize,
    normalize: NormalizeImage,
    infer: OrtInfer,
    post_op: DBPostProcess,
}

impl TextDetector {
    /// Creates a new text detector from a model file.
    ///
    /// # Arguments
    ///
    /// * `model_path` - The path to the detection ONNX model.
    ///
    /// # Returns
    ///
    /// A Result containing the detector or an OCRError.
    pub fn new(model_path: &Path) -> Result<Self, OCRError> {
        Ok(Self {
            resize: DetResize::new(constants::DET_LIMIT_SIDE_LEN),
            normalize: NormalizeImage::for_detection(),
            infer: OrtInfer::new(model_path, DET_INPUT_NAME)?,
            post_op: DBPostProcess::new(),
        })
    }

    /// Detects text regions and returns them in reading order.
    ///
    /// # Arguments
    ///
    /// * `img` - The image to scan.
    ///
    /// # Returns
    ///
    /// A Result containing `(box, score)` pairs sorted top-to-bottom,
    /// left-to-right.
    pub fn detect(&self, img: &RgbaImage) -> Result<Vec<(TextBox, f32)>, OCRError> {
        let mut candidates = Vec::new();
        self.detect_streaming(img, |text_box, score| {
            candidates.push((text_box, score));
            false
        })?;

        debug!(regions = candidates.len(), "text detection complete");
        Ok(sort_reading_order(candidates))
    }

    /// Detects text regions, streaming each accepted box through a sink.
    ///
    /// The sink receives boxes in probability-map scan order (not reading
    /// order); returning `true` halts emission. This is shared by the full
    /// detection path and the quick-check probe.
    ///
    /// # Arguments
    ///
    /// * `img` - The image to scan.
    /// * `sink` - Receives `(box, score)` pairs; `true` stops the scan.
    ///
    /// # Returns
    ///
    /// A Result indicating success or an inference error.
    pub fn detect_streaming<F>(&self, img: &RgbaImage, sink: F) -> Result<(), OCRError>
    where
        F: FnMut(TextBox, f32) -> bool,
    {
        let (resized, scale) = self.resize.apply(img);
        let (width, height) = resized.dimensions();

        let data = self.normalize.to_tensor(&resized)?;
        let input = Tensor4D::from_shape_vec((1, 3, height as usize, width as usize), data)?;

        let output = self.infer.infer_4d(input)?;
        let pred = output.index_axis(Axis(0), 0).index_axis(Axis(0), 0).to_owned();

        self.post_op.apply(&pred, &scale, sink);
        Ok(())
    }
}
