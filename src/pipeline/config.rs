//! Configuration for the OCR engine.

use crate::core::{constants, OCRError};
use std::path::{Path, PathBuf};

/// Configuration for the OCR engine.
///
/// All thresholds default to the pipeline constants; the model directory is
/// the only required field.
#[derive(Debug, Clone)]
pub struct OcrEngineConfig {
    /// Directory holding the model files and character dictionary.
    pub model_dir: PathBuf,
    /// Whether to run 180-degree angle classification when the model is
    /// available.
    pub use_angle_classification: bool,
    /// Minimum recognition confidence for a region to be reported.
    pub min_recognition_score: f32,
    /// Relaxed confidence floor used when all scores are requested.
    pub fallback_min_recognition_score: f32,
    /// Recognition results below this confidence get a classification retry.
    pub low_confidence_threshold: f32,
    /// Crops with an aspect ratio below this go through pass-1
    /// classification.
    pub angle_aspect_ratio_threshold: f32,
}

impl OcrEngineConfig {
    /// Creates a configuration with default thresholds.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Directory holding the model files.
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            use_angle_classification: true,
            min_recognition_score: constants::MIN_RECOGNITION_SCORE,
            fallback_min_recognition_score: constants::FALLBACK_MIN_RECOGNITION_SCORE,
            low_confidence_threshold: constants::LOW_CONFIDENCE_THRESHOLD,
            angle_aspect_ratio_threshold: constants::ANGLE_ASPECT_RATIO_THRESHOLD,
        }
    }

    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// Ok if all thresholds are within range, an OCRError otherwise.
    pub fn validate(&self) -> Result<(), OCRError> {
        for (name, value) in [
            ("min_recognition_score", self.min_recognition_score),
            (
                "fallback_min_recognition_score",
                self.fallback_min_recognition_score,
            ),
            ("low_confidence_threshold", self.low_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OCRError::config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.fallback_min_recognition_score > self.min_recognition_score {
            return Err(OCRError::config(
                "fallback_min_recognition_score must not exceed min_recognition_score",
            ));
        }

        if self.angle_aspect_ratio_threshold <= 0.0 {
            return Err(OCRError::config(
                "angle_aspect_ratio_threshold must be positive",
            ));
        }

        Ok(())
    }

    /// The confidence floor in effect for a request.
    pub fn score_floor(&self, include_all_confidence_scores: bool) -> f32 {
        if include_all_confidence_scores {
            self.fallback_min_recognition_score
        } else {
            self.min_recognition_score
        }
    }

    /// Path to the detection model file.
    pub fn det_model_path(&self) -> PathBuf {
        self.model_dir.join(constants::DET_MODEL_FILE)
    }

    /// Path to the recognition model file.
    pub fn rec_model_path(&self) -> PathBuf {
        self.model_dir.join(constants::REC_MODEL_FILE)
    }

    /// Path to the optional angle classification model file.
    pub fn cls_model_path(&self) -> PathBuf {
        self.model_dir.join(constants::CLS_MODEL_FILE)
    }

    /// Path to the character dictionary file.
    pub fn dict_path(&self) -> PathBuf {
        self.model_dir.join(constants::DICT_FILE)
    }
}

/// Builder for [`crate::pipeline::OcrEngine`].
///
/// This struct provides a fluent API for configuring and building the
/// engine.
#[derive(Debug)]
pub struct OcrEngineBuilder {
    config: OcrEngineConfig,
}

impl OcrEngineBuilder {
    /// Creates a builder for a model directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Directory holding the model files.
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        Self {
            config: OcrEngineConfig::new(model_dir.as_ref().to_path_buf()),
        }
    }

    /// Enables or disables angle classification.
    pub fn use_angle_classification(mut self, use_it: bool) -> Self {
        self.config.use_angle_classification = use_it;
        self
    }

    /// Sets the minimum recognition confidence for reported regions.
    pub fn min_recognition_score(mut self, score: f32) -> Self {
        self.config.min_recognition_score = score;
        self
    }

    /// Sets the relaxed confidence floor used when all scores are requested.
    pub fn fallback_min_recognition_score(mut self, score: f32) -> Self {
        self.config.fallback_min_recognition_score = score;
        self
    }

    /// Sets the confidence below which results get a classification retry.
    pub fn low_confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.low_confidence_threshold = threshold;
        self
    }

    /// Builds the engine after validating the configuration.
    ///
    /// # Returns
    ///
    /// A Result containing the engine or an OCRError.
    pub fn build(self) -> Result<crate::pipeline::OcrEngine, OCRError> {
        crate::pipeline::OcrEngine::new(self.config)
    }
}
