//! CTC text recognizer.
//!
//! This module implements the text recognition predictor: crops are sorted
//! by aspect ratio and packed in groups of six into a shared dynamic-width
//! tensor (which keeps per-batch padding small), each batch takes one
//! forward pass, and the output sequences are greedily CTC-decoded with
//! character span tracking. Results are written back to the caller's
//! original indices, so the internal sort is invisible from outside.

use crate::core::{constants, OCRError, OrtInfer, Tensor4D};
use crate::processors::{CTCLabelDecode, NormalizeImage, RecResize, RecognitionResult};
use image::RgbaImage;
use std::path::Path;
use tracing::debug;

/// Text recognition predictor.
#[derive(Debug)]
pub struct TextRecognizer {
    resize: RecResize,
    normalize: NormalizeImage,
    infer: OrtInfer,
    decode: CTCLabelDecode,
}

impl TextRecognizer {
    /// Creates a new text recognizer from a model file and vocabulary.
    ///
    /// # Arguments
    ///
    /// * `model_path` - The path to the recognition ONNX model.
    /// * `dictionary` - The CTC vocabulary (see [`crate::utils::dict`]).
    ///
    /// # Returns
    ///
    /// A Result containing the recognizer or an OCRError.
    pub fn new(model_path: &Path, dictionary: Vec<String>) -> Result<Self, OCRError> {
        Ok(Self {
            resize: RecResize::new(constants::REC_IMAGE_HEIGHT),
            normalize: NormalizeImage::for_recognition(),
            infer: OrtInfer::with_first_input_name(model_path)?,
            decode: CTCLabelDecode::new(dictionary),
        })
    }

    /// Recognizes text in a set of crops.
    ///
    /// A batch whose model readback is degenerate yields empty recognitions
    /// for its crops rather than failing the request.
    ///
    /// # Arguments
    ///
    /// * `crops` - The rectified text strips to read.
    ///
    /// # Returns
    ///
    /// A Result containing one recognition per crop, in input order.
    pub fn recognize(&self, crops: &[&RgbaImage]) -> Result<Vec<RecognitionResult>, OCRError> {
        let mut results = vec![RecognitionResult::default(); crops.len()];
        if crops.is_empty() {
            return Ok(results);
        }

        let ratios: Vec<f32> = crops
            .iter()
            .map(|crop| {
                let (w, h) = crop.dimensions();
                if h == 0 {
                    0.0
                } else {
                    w as f32 / h as f32
                }
            })
            .collect();

        let height = constants::REC_IMAGE_HEIGHT;
        let base_ratio = constants::REC_BASE_WIDTH as f32 / height as f32;

        for batch in plan_batches(&ratios, constants::REC_BATCH_SIZE) {
            let max_wh_ratio = batch
                .iter()
                .map(|&idx| ratios[idx])
                .fold(base_ratio, f32::max);
            let packed_width =
                ((height as f32 * max_wh_ratio).ceil() as u32).clamp(1, constants::MAX_SIDE_LEN);

            let plane_h = height as usize;
            let plane_w = packed_width as usize;
            let plane_size = 3 * plane_h * plane_w;

            let mut data = vec![0.0f32; batch.len() * plane_size];
            let mut content_widths = Vec::with_capacity(batch.len());
            for (slot, &idx) in batch.iter().enumerate() {
                let resized = self.resize.apply(crops[idx], packed_width);
                content_widths.push(resized.width());
                self.normalize.pack_into(
                    &resized,
                    &mut data,
                    slot * plane_size,
                    plane_h,
                    plane_w,
                )?;
            }

            let input = Tensor4D::from_shape_vec((batch.len(), 3, plane_h, plane_w), data)?;
            let Some(output) = self.infer.infer_3d(input)? else {
                continue;
            };

            let decoded = self.decode.apply(&output, &content_widths, packed_width);
            for (slot, result) in decoded.into_iter().enumerate() {
                if slot < batch.len() {
                    results[batch[slot]] = result;
                }
            }
        }

        debug!(
            crops = crops.len(),
            recognized = results.iter().filter(|r| !r.text.is_empty()).count(),
            "text recognition complete"
        );
        Ok(results)
    }
}

/// Groups crop indices into recognition batches.
///
/// Indices are sorted by aspect ratio ascending and assembled into
/// consecutive groups of up to `batch_size`, which keeps the width spread
/// (and therefore the padding) within each batch small.
///
/// # Arguments
///
/// * `ratios` - Per-crop width/height ratios.
/// * `batch_size` - Maximum batch size.
///
/// # Returns
///
/// Index groups covering all crops exactly once.
fn plan_batches(ratios: &[f32], batch_size: usize) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..ratios.len()).collect();
    order.sort_by(|&a, &b| {
        ratios[a]
            .partial_cmp(&ratios[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    order
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_batches_sorts_by_ratio() {
        let ratios = vec![4.0, 1.0, 8.0, 2.0];
        let batches = plan_batches(&ratios, 2);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec![1, 3]);
        assert_eq!(batches[1], vec![0, 2]);
    }

    #[test]
    fn test_plan_batches_covers_all_indices() {
        let ratios = vec![3.0, 1.5, 6.0, 2.5, 9.0, 0.5, 7.0];
        let batches = plan_batches(&ratios, 6);

        let mut seen: Vec<usize> = batches.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..ratios.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_plan_batches_empty() {
        assert!(plan_batches(&[], 6).is_empty());
    }
}
