//! Result types produced by the OCR pipeline.
//!
//! These are the values that cross the library boundary, so they carry
//! serde derives and serialize with the camelCase field names the transport
//! layer expects.

use crate::processors::geometry::{Point, Rect, TextBox};
use serde::{Deserialize, Serialize};

/// One recognized character projected back onto the original image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterBox {
    /// The decoded token.
    pub text: String,
    /// Confidence of the decoded token.
    pub confidence: f32,
    /// The four corners of the character's quadrilateral, clockwise.
    pub points: [Point; 4],
}

/// One recognized text region, as serialized out of the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRegion {
    /// The recognized text; never empty once filtering has run.
    pub text: String,
    /// Mean per-character recognition confidence.
    pub confidence: f32,
    /// The four corners of the region, clockwise from top-left.
    pub points: [Point; 4],
    /// Axis-aligned bounding box of the corners.
    pub bounding_box: Rect,
    /// Per-character sub-boxes.
    pub characters: Vec<CharacterBox>,
}

/// The full result of one `process_image` call.
///
/// The four arrays are parallel: index `i` of each describes the same
/// recognized region.
#[derive(Debug, Clone, Default)]
pub struct OcrResult {
    /// Oriented region boxes, in reading order.
    pub boxes: Vec<TextBox>,
    /// Recognized text per region.
    pub texts: Vec<String>,
    /// Recognition confidence per region.
    pub scores: Vec<f32>,
    /// Character boxes per region.
    pub characters: Vec<Vec<CharacterBox>>,
}

impl OcrResult {
    /// Number of recognized regions.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether no region survived filtering.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Converts the parallel arrays into self-contained regions.
    pub fn into_regions(self) -> Vec<TextRegion> {
        self.boxes
            .into_iter()
            .zip(self.texts)
            .zip(self.scores)
            .zip(self.characters)
            .map(|(((text_box, text), confidence), characters)| {
                let bounding_box = text_box.bounding_rect();
                TextRegion {
                    text,
                    confidence,
                    points: *text_box.points(),
                    bounding_box,
                    characters,
                }
            })
            .collect()
    }
}

/// Diagnostic record of the fast `has_text` probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickCheckReport {
    /// True only when a detection and a recognition both cleared their
    /// thresholds.
    pub has_text: bool,
    /// Whether the detector produced any candidate above the probe
    /// threshold.
    pub detector_hit: bool,
    /// Number of candidates collected from the detector.
    pub examined_candidates: usize,
    /// Number of candidates actually recognized before stopping.
    pub evaluated_candidates: usize,
    /// Best recognition confidence seen during the probe.
    pub best_recognition_score: f32,
}

/// Status report of the model preparation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareModelsReport {
    /// Whether all required sessions and the dictionary are loaded.
    pub is_ready: bool,
    /// Version tag of the model set.
    pub version: String,
    /// Directory the models were loaded from.
    pub model_path: String,
    /// Initialization error, when not ready.
    pub error: Option<String>,
}
