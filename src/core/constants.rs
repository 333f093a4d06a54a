//! Constants used throughout the OCR pipeline.

/// Longer image side is scaled down to this length before text detection.
pub const DET_LIMIT_SIDE_LEN: u32 = 960;

/// Threshold that binarizes the detection probability map.
pub const DET_THRESH: f32 = 0.3;

/// Minimum mean probability inside a candidate rectangle.
pub const DET_BOX_THRESH: f32 = 0.6;

/// Outward expansion factor applied to detected rectangles.
pub const DET_UNCLIP_RATIO: f32 = 1.5;

/// Minimum shorter side of an expanded rectangle, in resized-image pixels.
pub const DET_MIN_SIZE: f32 = 3.0;

/// Number of connected components retained, by pixel count.
pub const DET_MAX_CANDIDATES: usize = 1000;

/// Boxes whose minimum y differ by at most this many pixels share a text line.
pub const SORT_LINE_TOLERANCE: f32 = 10.0;

/// Input height of the recognition model.
pub const REC_IMAGE_HEIGHT: u32 = 48;

/// Base recognition strip width used as the lower bound for batch packing.
pub const REC_BASE_WIDTH: u32 = 320;

/// Number of crops per recognition batch.
pub const REC_BATCH_SIZE: usize = 6;

/// Input height of the angle classification model.
pub const CLS_IMAGE_HEIGHT: u32 = 48;

/// Input width of the angle classification model.
pub const CLS_IMAGE_WIDTH: u32 = 192;

/// Number of crops per classification batch.
pub const CLS_BATCH_SIZE: usize = 6;

/// A crop is flipped only when the 180-degree class wins with at least this probability.
pub const CLS_ROTATE_THRESH: f32 = 0.9;

/// Minimum recognition confidence for a region to be reported.
pub const MIN_RECOGNITION_SCORE: f32 = 0.8;

/// Relaxed confidence floor used when all scores are requested.
pub const FALLBACK_MIN_RECOGNITION_SCORE: f32 = 0.5;

/// Crops with an aspect ratio below this are sent to pass-1 angle classification.
pub const ANGLE_ASPECT_RATIO_THRESHOLD: f32 = 0.5;

/// Recognition results below this confidence get a classification retry.
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.65;

/// Detection score a candidate must reach to enter the quick-check probe.
pub const QUICK_CHECK_DET_THRESH: f32 = 0.9;

/// Number of candidates the quick-check probe collects at most.
pub const QUICK_CHECK_MAX_CANDIDATES: usize = 3;

/// Upper bound on any packed tensor side or crop side, in pixels.
pub const MAX_SIDE_LEN: u32 = 10_000;

/// Smallest span a decoded character may occupy along the recognition strip.
pub const MIN_CHAR_SPAN_RATIO: f32 = 1e-3;

/// Character boxes narrower than this after clamping are dropped.
pub const MIN_CHAR_BOX_RATIO: f32 = 1e-4;

/// File name of the text detection model inside the model directory.
pub const DET_MODEL_FILE: &str = "det.onnx";

/// File name of the text recognition model inside the model directory.
pub const REC_MODEL_FILE: &str = "rec.onnx";

/// File name of the optional angle classification model inside the model directory.
pub const CLS_MODEL_FILE: &str = "cls.onnx";

/// File name of the character dictionary inside the model directory.
pub const DICT_FILE: &str = "ppocrv5_dict.txt";

/// Version tag reported once the model directory has been prepared.
pub const MODEL_VERSION: &str = "pp-ocrv5-202410";
