//! Tensor type aliases shared across the OCR pipeline.
//!
//! All tensors exchanged with the inference runtime are dense `f32`
//! `ndarray` arrays. The aliases below fix the dimensionality used by each
//! stage: `[N, 3, H, W]` image batches going in, `[N, 2]` classification
//! logits, `[N, T, V]` recognition sequences, and `[N, 1, H, W]` detection
//! probability maps coming out.

use ndarray::{Array1, Array2, Array3, Array4};

/// A 1-dimensional f32 tensor.
pub type Tensor1D = Array1<f32>;

/// A 2-dimensional f32 tensor.
pub type Tensor2D = Array2<f32>;

/// A 3-dimensional f32 tensor.
pub type Tensor3D = Array3<f32>;

/// A 4-dimensional f32 tensor.
pub type Tensor4D = Array4<f32>;
