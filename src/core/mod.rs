//! The core module of the OCR engine.
//!
//! This module contains the fundamental components of the OCR pipeline:
//! tensor type aliases, pipeline constants, error handling, and the
//! ONNX Runtime session wrapper. It also re-exports the commonly used
//! types for convenience.

pub mod batch;
pub mod constants;
pub mod errors;
pub mod inference;

pub use batch::{Tensor1D, Tensor2D, Tensor3D, Tensor4D};
pub use constants::*;
pub use errors::{OCRError, ProcessingStage};
pub use inference::OrtInfer;

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
