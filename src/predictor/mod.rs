//! OCR predictors.
//!
//! One predictor per model: text detection, 180-degree angle
//! classification, and text recognition. Each owns its ONNX session,
//! preprocessing, and post-processing; the [`crate::pipeline`] module wires
//! them together.

pub mod text_classifier;
pub mod text_detector;
pub mod text_recognizer;

pub use text_classifier::TextClassifier;
pub use text_detector::TextDetector;
pub use text_recognizer::TextRecognizer;
