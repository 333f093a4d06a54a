//! 180-degree text line angle classifier.
//!
//! Recognition models read a strip left to right, so a crop that came out of
//! the detector upside down has to be flipped first. This classifier scores
//! each crop against the two classes 0° and 180°; a crop is flagged for
//! rotation only when the 180° class wins with high confidence.

use crate::core::{constants, OCRError, OrtInfer, Tensor4D};
use crate::processors::{NormalizeImage, RecResize};
use image::RgbaImage;
use std::path::Path;
use tracing::debug;

/// Text line angle classification predictor.
#[derive(Debug)]
pub struct TextClassifier {
    resize: RecResize,
    normalize: NormalizeImage,
    infer: OrtInfer,
}

impl TextClassifier {
    /// Creates a new angle classifier from a model file.
    ///
    /// # Arguments
    ///
    /// * `model_path` - The path to the classification ONNX model.
    ///
    /// # Returns
    ///
    /// A Result containing the classifier or an OCRError.
    pub fn new(model_path: &Path) -> Result<Self, OCRError> {
        Ok(Self {
            resize: RecResize::new(constants::CLS_IMAGE_HEIGHT),
            normalize: NormalizeImage::for_recognition(),
            infer: OrtInfer::with_first_input_name(model_path)?,
        })
    }

    /// Decides for each crop whether it is upside down.
    ///
    /// Crops are resized to 48x192 (zero-padded on the right) and scored in
    /// batches of 6. A crop votes "rotate" iff the 180° probability beats
    /// the 0° probability and exceeds the rotation threshold. A degenerate
    /// model readback leaves the affected batch unrotated.
    ///
    /// # Arguments
    ///
    /// * `crops` - The crops to classify.
    ///
    /// # Returns
    ///
    /// A Result containing one rotation flag per crop, in input order.
    pub fn classify(&self, crops: &[&RgbaImage]) -> Result<Vec<bool>, OCRError> {
        let mut flags = vec![false; crops.len()];

        let plane_h = constants::CLS_IMAGE_HEIGHT as usize;
        let plane_w = constants::CLS_IMAGE_WIDTH as usize;
        let plane_size = 3 * plane_h * plane_w;

        for (batch_start, batch) in crops
            .chunks(constants::CLS_BATCH_SIZE)
            .enumerate()
            .map(|(i, chunk)| (i * constants::CLS_BATCH_SIZE, chunk))
        {
            let mut data = vec![0.0f32; batch.len() * plane_size];
            for (slot, crop) in batch.iter().enumerate() {
                let resized = self.resize.apply(crop, constants::CLS_IMAGE_WIDTH);
                self.normalize.pack_into(
                    &resized,
                    &mut data,
                    slot * plane_size,
                    plane_h,
                    plane_w,
                )?;
            }

            let input = Tensor4D::from_shape_vec((batch.len(), 3, plane_h, plane_w), data)?;
            let Some(output) = self.infer.infer_2d(input)? else {
                continue;
            };
            if output.shape()[1] < 2 {
                continue;
            }

            for (slot, row) in output.outer_iter().enumerate() {
                let p0 = row[0];
                let p180 = row[1];
                flags[batch_start + slot] = p180 > p0 && p180 > constants::CLS_ROTATE_THRESH;
            }
        }

        debug!(
            crops = crops.len(),
            rotated = flags.iter().filter(|&&f| f).count(),
            "angle classification complete"
        );
        Ok(flags)
    }
}
