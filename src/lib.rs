//! mobile-ocr - on-device OCR for still images.
//!
//! This library runs the PaddleOCR v5 pipeline over ONNX Runtime without
//! any network access: DB text detection produces oriented text boxes, each
//! region is rectified with a perspective warp, an optional classifier
//! flips upside-down crops, and a CTC recognizer reads the text together
//! with per-character sub-boxes and confidence scores.
//!
//! # Modules
//!
//! * [`core`] - Tensor aliases, constants, errors, and the ONNX session wrapper
//! * [`processors`] - Geometry, normalization, resizing, and decoding stages
//! * [`predictor`] - The detection, classification, and recognition predictors
//! * [`pipeline`] - The engine combining all components
//! * [`utils`] - Image loading, dictionary parsing, and perspective transforms
//!
//! # Examples
//!
//! ```rust,no_run
//! use mobile_ocr::prelude::*;
//!
//! # fn main() -> Result<(), OCRError> {
//! let engine = OcrEngineBuilder::new("/path/to/models").build()?;
//! let report = engine.prepare_models();
//! assert!(report.is_ready);
//!
//! for region in engine.detect_text("photo.jpg", false)? {
//!     println!("{} ({:.2})", region.text, region.confidence);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pipeline;
pub mod predictor;
pub mod processors;
pub mod utils;

/// A prelude module for convenient imports.
///
/// This module re-exports the types most callers need: the engine and its
/// builder, the result types, and the error enum.
pub mod prelude {
    pub use crate::core::{init_tracing, OCRError, ProcessingStage};
    pub use crate::pipeline::{
        CharacterBox, OcrEngine, OcrEngineBuilder, OcrEngineConfig, OcrResult,
        PrepareModelsReport, QuickCheckReport, TextRegion,
    };
    pub use crate::processors::{CharacterSpan, Point, RecognitionResult, Rect, TextBox};
}
