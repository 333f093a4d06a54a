//! The OCR pipeline.
//!
//! This module combines the detector, angle classifier, and recognizer into
//! the public engine: full-image OCR with character boxes, and the
//! quick-check probe for "does this image contain text at all".

pub mod config;
pub mod processor;
pub mod result;

pub use config::{OcrEngineBuilder, OcrEngineConfig};
pub use processor::OcrEngine;
pub use result::{CharacterBox, OcrResult, PrepareModelsReport, QuickCheckReport, TextRegion};
