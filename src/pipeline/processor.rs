//! The OCR engine: detection, cropping, classification, recognition, and
//! result assembly.
//!
//! [`OcrEngine`] owns the three inference sessions and the character
//! dictionary for the lifetime of the process. Initialization is
//! single-flight: the first request loads the models, concurrent requests
//! wait, and later requests skip the lock entirely.
//!
//! The full pipeline runs detect, warp-crops each region, optionally flips
//! upside-down crops (with a low-confidence retry pass), recognizes, and
//! projects per-character spans back onto the original image. The
//! quick-check probe short-circuits: it streams a handful of high-score
//! detections and stops at the first confident recognition.

use crate::core::{constants, OCRError};
use crate::pipeline::config::OcrEngineConfig;
use crate::pipeline::result::{
    CharacterBox, OcrResult, PrepareModelsReport, QuickCheckReport, TextRegion,
};
use crate::predictor::{TextClassifier, TextDetector, TextRecognizer};
use crate::processors::decode::{CharacterSpan, RecognitionResult};
use crate::processors::geometry::{Point, TextBox};
use crate::utils::{
    get_perspective_transform, load_dictionary, load_rgba_image, rotate_180, rotate_90_ccw,
    warp_perspective,
};
use image::RgbaImage;
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::{debug, info, warn};

/// The loaded inference sessions and dictionary.
struct Components {
    detector: TextDetector,
    recognizer: TextRecognizer,
    classifier: Option<TextClassifier>,
}

/// One detected region's crop state through the pipeline.
///
/// The warped crop is kept immutable in `base`; classification outcomes
/// only ever replace `effective`, so pass-1 and pass-2 decisions stay
/// traceable.
struct CropSlot {
    text_box: TextBox,
    base: RgbaImage,
    effective: RgbaImage,
    rotated: bool,
    examined: bool,
}

/// The OCR engine.
pub struct OcrEngine {
    config: OcrEngineConfig,
    components: OnceCell<Components>,
}

impl OcrEngine {
    /// Creates a new engine; models are loaded lazily on first use.
    ///
    /// # Arguments
    ///
    /// * `config` - The engine configuration.
    ///
    /// # Returns
    ///
    /// A Result containing the engine, or an OCRError when the configuration
    /// is invalid.
    pub fn new(config: OcrEngineConfig) -> Result<Self, OCRError> {
        config.validate()?;
        Ok(Self {
            config,
            components: OnceCell::new(),
        })
    }

    /// Loads the models and dictionary, reporting the outcome.
    ///
    /// Initialization happens at most once; concurrent callers wait for the
    /// first one to finish. A missing required model is terminal for the
    /// session and reported through the `error` field.
    ///
    /// # Returns
    ///
    /// The preparation status report.
    pub fn prepare_models(&self) -> PrepareModelsReport {
        let model_path = self.config.model_dir.display().to_string();
        match self.components() {
            Ok(_) => PrepareModelsReport {
                is_ready: true,
                version: constants::MODEL_VERSION.to_string(),
                model_path,
                error: None,
            },
            Err(e) => PrepareModelsReport {
                is_ready: false,
                version: constants::MODEL_VERSION.to_string(),
                model_path,
                error: Some(e.to_string()),
            },
        }
    }

    /// Whether the sessions are loaded.
    pub fn is_ready(&self) -> bool {
        self.components.get().is_some()
    }

    /// Releases the inference sessions and the dictionary.
    ///
    /// A later request re-initializes them.
    pub fn close(&mut self) {
        if self.components.take().is_some() {
            info!("ocr engine sessions released");
        }
    }

    /// Runs the full OCR pipeline over an image file.
    ///
    /// # Arguments
    ///
    /// * `image_path` - Path to the image to process.
    /// * `include_all_confidence_scores` - Lowers the confidence floor from
    ///   0.8 to 0.5.
    ///
    /// # Returns
    ///
    /// A Result containing the recognized regions in reading order.
    pub fn detect_text(
        &self,
        image_path: impl AsRef<Path>,
        include_all_confidence_scores: bool,
    ) -> Result<Vec<TextRegion>, OCRError> {
        let img = load_rgba_image(image_path)?;
        let result = self.process_image(&img, include_all_confidence_scores)?;
        Ok(result.into_regions())
    }

    /// Probes whether the image contains high-confidence text.
    ///
    /// # Arguments
    ///
    /// * `image_path` - Path to the image to probe.
    ///
    /// # Returns
    ///
    /// A Result containing the verdict.
    pub fn has_text(&self, image_path: impl AsRef<Path>) -> Result<bool, OCRError> {
        Ok(self.quick_check(image_path)?.has_text)
    }

    /// Runs the quick-check probe and returns its diagnostic record.
    ///
    /// Up to three detections with score >= 0.9 are collected; each is
    /// cropped, optionally angle-classified, and recognized one at a time
    /// until a recognition reaches the reporting threshold with non-empty
    /// text.
    ///
    /// # Arguments
    ///
    /// * `image_path` - Path to the image to probe.
    ///
    /// # Returns
    ///
    /// A Result containing the probe report.
    pub fn quick_check(&self, image_path: impl AsRef<Path>) -> Result<QuickCheckReport, OCRError> {
        let components = self.components()?;
        let img = load_rgba_image(image_path)?;

        let mut candidates: Vec<(TextBox, f32)> = Vec::new();
        components.detector.detect_streaming(&img, |text_box, score| {
            offer_quick_candidate(&mut candidates, text_box, score)
        })?;

        let report = run_quick_check(&candidates, |text_box| {
            self.evaluate_candidate(components, &img, text_box)
        })?;

        debug!(
            has_text = report.has_text,
            examined = report.examined_candidates,
            evaluated = report.evaluated_candidates,
            "quick check complete"
        );
        Ok(report)
    }

    /// Runs the full pipeline over an already-decoded image.
    ///
    /// # Arguments
    ///
    /// * `img` - The decoded image.
    /// * `include_all_confidence_scores` - Lowers the confidence floor from
    ///   0.8 to 0.5.
    ///
    /// # Returns
    ///
    /// A Result containing the parallel result arrays.
    pub fn process_image(
        &self,
        img: &RgbaImage,
        include_all_confidence_scores: bool,
    ) -> Result<OcrResult, OCRError> {
        let components = self.components()?;

        let detections = components.detector.detect(img)?;
        if detections.is_empty() {
            return Ok(OcrResult::default());
        }

        let mut slots: Vec<CropSlot> = Vec::with_capacity(detections.len());
        for (text_box, _score) in detections {
            match crop_text_region(img, &text_box) {
                Ok(crop) => slots.push(CropSlot {
                    text_box,
                    effective: crop.clone(),
                    base: crop,
                    rotated: false,
                    examined: false,
                }),
                Err(e) => warn!(error = %e, "skipping region with degenerate crop"),
            }
        }

        // Pass 1: suspiciously tall crops get an orientation check before
        // recognition.
        if let Some(classifier) = &components.classifier {
            let selected: Vec<usize> = slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| {
                    aspect_ratio(&slot.effective) < self.config.angle_aspect_ratio_threshold
                })
                .map(|(i, _)| i)
                .collect();

            if !selected.is_empty() {
                let crops: Vec<&RgbaImage> =
                    selected.iter().map(|&i| &slots[i].effective).collect();
                let flags = classifier.classify(&crops)?;
                for (&i, flag) in selected.iter().zip(flags) {
                    let slot = &mut slots[i];
                    slot.examined = true;
                    if flag {
                        slot.effective = rotate_180(&slot.base);
                        slot.rotated = true;
                    }
                }
            }
        }

        let crops: Vec<&RgbaImage> = slots.iter().map(|slot| &slot.effective).collect();
        let mut results = components.recognizer.recognize(&crops)?;

        // Pass 2: low-confidence results that skipped pass 1 get a
        // classification retry; a retried recognition only replaces the
        // original when it is strictly better.
        if let Some(classifier) = &components.classifier {
            let retry: Vec<usize> = slots
                .iter()
                .zip(&results)
                .enumerate()
                .filter(|(_, (slot, result))| {
                    result.confidence < self.config.low_confidence_threshold && !slot.examined
                })
                .map(|(i, _)| i)
                .collect();

            if !retry.is_empty() {
                let crops: Vec<&RgbaImage> = retry.iter().map(|&i| &slots[i].effective).collect();
                let flags = classifier.classify(&crops)?;
                let touched: Vec<usize> = retry
                    .iter()
                    .zip(&flags)
                    .filter(|(_, &flag)| flag)
                    .map(|(&i, _)| i)
                    .collect();

                if !touched.is_empty() {
                    let flipped: Vec<RgbaImage> = touched
                        .iter()
                        .map(|&i| rotate_180(&slots[i].effective))
                        .collect();
                    let refs: Vec<&RgbaImage> = flipped.iter().collect();
                    let retried = components.recognizer.recognize(&refs)?;

                    let mut replaced = 0usize;
                    for ((&i, crop), result) in
                        touched.iter().zip(flipped.iter()).zip(retried)
                    {
                        if result.confidence > results[i].confidence {
                            results[i] = result;
                            let slot = &mut slots[i];
                            slot.effective = crop.clone();
                            // Toggle rather than set, so two flips cancel.
                            slot.rotated = !slot.rotated;
                            replaced += 1;
                        }
                    }
                    debug!(retried = touched.len(), replaced, "low-confidence retry");
                }
            }
        }

        let floor = self.config.score_floor(include_all_confidence_scores);
        let mut ocr = OcrResult::default();
        for (slot, result) in slots.into_iter().zip(results) {
            if result.confidence < floor {
                continue;
            }
            let characters =
                project_character_boxes(&slot.text_box, &result.characters, slot.rotated);
            ocr.boxes.push(slot.text_box);
            ocr.texts.push(result.text);
            ocr.scores.push(result.confidence);
            ocr.characters.push(characters);
        }

        info!(regions = ocr.len(), "ocr pipeline complete");
        Ok(ocr)
    }

    /// Returns the loaded components, initializing them single-flight.
    fn components(&self) -> Result<&Components, OCRError> {
        self.components.get_or_try_init(|| self.load_components())
    }

    fn load_components(&self) -> Result<Components, OCRError> {
        let det_path = self.config.det_model_path();
        if !det_path.is_file() {
            return Err(OCRError::config(format!(
                "missing detection model at {}",
                det_path.display()
            )));
        }
        let rec_path = self.config.rec_model_path();
        if !rec_path.is_file() {
            return Err(OCRError::config(format!(
                "missing recognition model at {}",
                rec_path.display()
            )));
        }

        let dictionary = load_dictionary(self.config.dict_path())?;
        let detector = TextDetector::new(&det_path)?;
        let recognizer = TextRecognizer::new(&rec_path, dictionary)?;

        let cls_path = self.config.cls_model_path();
        let classifier = if self.config.use_angle_classification && cls_path.is_file() {
            Some(TextClassifier::new(&cls_path)?)
        } else {
            if self.config.use_angle_classification {
                info!("no classification model found, angle classification disabled");
            }
            None
        };

        info!(
            model_dir = %self.config.model_dir.display(),
            angle_classification = classifier.is_some(),
            "ocr engine initialized"
        );

        Ok(Components {
            detector,
            recognizer,
            classifier,
        })
    }

    /// Crops, optionally angle-classifies, and recognizes one quick-check
    /// candidate.
    fn evaluate_candidate(
        &self,
        components: &Components,
        img: &RgbaImage,
        text_box: &TextBox,
    ) -> Result<RecognitionResult, OCRError> {
        let crop = match crop_text_region(img, text_box) {
            Ok(crop) => crop,
            Err(e) => {
                warn!(error = %e, "quick-check candidate has a degenerate crop");
                return Ok(RecognitionResult::default());
            }
        };

        let mut effective = crop;
        if let Some(classifier) = &components.classifier {
            if aspect_ratio(&effective) < self.config.angle_aspect_ratio_threshold {
                let flags = classifier.classify(&[&effective])?;
                if flags.first().copied().unwrap_or(false) {
                    effective = rotate_180(&effective);
                }
            }
        }

        let results = components.recognizer.recognize(&[&effective])?;
        Ok(results.into_iter().next().unwrap_or_default())
    }
}

/// Width/height ratio of a crop.
fn aspect_ratio(img: &RgbaImage) -> f32 {
    let (w, h) = img.dimensions();
    if h == 0 {
        0.0
    } else {
        w as f32 / h as f32
    }
}

/// Rectifies an oriented text region into an axis-aligned crop.
///
/// The destination size is the larger of the two horizontal edges by the
/// larger of the two vertical edges, clamped to `[1, 10000]`. Crops that
/// come out at least 1.5x taller than wide are laid on their side.
///
/// # Arguments
///
/// * `img` - The source image.
/// * `text_box` - The region to rectify.
///
/// # Returns
///
/// A Result containing the rectified crop or an OCRError for a degenerate
/// quad.
fn crop_text_region(img: &RgbaImage, text_box: &TextBox) -> Result<RgbaImage, OCRError> {
    let (top, right, bottom, left) = text_box.edge_lengths();
    let dst_w = (top.max(bottom).round() as u32).clamp(1, constants::MAX_SIDE_LEN);
    let dst_h = (left.max(right).round() as u32).clamp(1, constants::MAX_SIDE_LEN);

    let dst = [
        Point::new(0.0, 0.0),
        Point::new(dst_w as f32, 0.0),
        Point::new(dst_w as f32, dst_h as f32),
        Point::new(0.0, dst_h as f32),
    ];

    let matrix = get_perspective_transform(text_box.points(), &dst)?;
    let crop = warp_perspective(img, &matrix, dst_w, dst_h)?;

    if crop.height() as f32 >= crop.width() as f32 * 1.5 {
        Ok(rotate_90_ccw(&crop))
    } else {
        Ok(crop)
    }
}

/// Sink fed by the detector during the quick-check probe.
///
/// Accepts candidates whose detection score clears the probe threshold and
/// asks the detector to stop once enough have been collected.
fn offer_quick_candidate(
    candidates: &mut Vec<(TextBox, f32)>,
    text_box: TextBox,
    score: f32,
) -> bool {
    if score >= constants::QUICK_CHECK_DET_THRESH {
        candidates.push((text_box, score));
    }
    candidates.len() >= constants::QUICK_CHECK_MAX_CANDIDATES
}

/// Evaluates quick-check candidates in detection order, stopping at the
/// first confident non-empty recognition.
fn run_quick_check<F>(
    candidates: &[(TextBox, f32)],
    mut evaluate: F,
) -> Result<QuickCheckReport, OCRError>
where
    F: FnMut(&TextBox) -> Result<RecognitionResult, OCRError>,
{
    let mut report = QuickCheckReport {
        detector_hit: !candidates.is_empty(),
        examined_candidates: candidates.len(),
        ..Default::default()
    };

    for (text_box, _score) in candidates {
        let result = evaluate(text_box)?;
        report.evaluated_candidates += 1;
        report.best_recognition_score = report.best_recognition_score.max(result.confidence);
        if result.confidence >= constants::MIN_RECOGNITION_SCORE && !result.text.is_empty() {
            report.has_text = true;
            break;
        }
    }

    Ok(report)
}

/// Projects decoded character spans back onto the original image.
///
/// Each span's `[start, end]` interval is interpolated along the top edge
/// (top-left to top-right) and the bottom edge (bottom-left to
/// bottom-right) of the region quad. When the crop was net-rotated, the
/// interval is mirrored to `(1 - end, 1 - start)` first. Spans whose width
/// collapses below 1e-4 after clamping are dropped.
///
/// # Arguments
///
/// * `text_box` - The region quad, clockwise from top-left.
/// * `spans` - The decoded character spans.
/// * `rotated` - Whether the crop carries a net 180-degree flip.
///
/// # Returns
///
/// The surviving character boxes in span order.
fn project_character_boxes(
    text_box: &TextBox,
    spans: &[CharacterSpan],
    rotated: bool,
) -> Vec<CharacterBox> {
    let [tl, tr, br, bl] = text_box.points();
    let lerp = |a: &Point, b: &Point, t: f32| Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);

    let mut boxes = Vec::with_capacity(spans.len());
    for span in spans {
        let (mut start, mut end) = if rotated {
            (1.0 - span.end_ratio, 1.0 - span.start_ratio)
        } else {
            (span.start_ratio, span.end_ratio)
        };
        start = start.clamp(0.0, 1.0);
        end = end.clamp(0.0, 1.0);
        if end - start < constants::MIN_CHAR_BOX_RATIO {
            continue;
        }

        boxes.push(CharacterBox {
            text: span.text.clone(),
            confidence: span.confidence,
            points: [
                lerp(tl, tr, start),
                lerp(tl, tr, end),
                lerp(bl, br, end),
                lerp(bl, br, start),
            ],
        });
    }

    boxes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> TextBox {
        TextBox::new([
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 20.0),
            Point::new(0.0, 20.0),
        ])
    }

    fn span(text: &str, start: f32, end: f32) -> CharacterSpan {
        CharacterSpan {
            text: text.to_string(),
            confidence: 0.9,
            start_ratio: start,
            end_ratio: end,
        }
    }

    #[test]
    fn test_character_boxes_follow_spans() {
        let spans = vec![span("h", 0.0, 0.4), span("i", 0.5, 0.9)];
        let boxes = project_character_boxes(&region(), &spans, false);

        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].points[0], Point::new(0.0, 0.0));
        assert_eq!(boxes[0].points[1], Point::new(40.0, 0.0));
        assert_eq!(boxes[1].points[0], Point::new(50.0, 0.0));
        assert_eq!(boxes[1].points[2], Point::new(90.0, 20.0));
    }

    #[test]
    fn test_rotated_spans_are_mirrored() {
        let spans = vec![span("h", 0.0, 0.4)];
        let boxes = project_character_boxes(&region(), &spans, true);

        // (0.0, 0.4) maps to (0.6, 1.0) under rotation.
        assert_eq!(boxes[0].points[0], Point::new(60.0, 0.0));
        assert_eq!(boxes[0].points[1], Point::new(100.0, 0.0));
    }

    #[test]
    fn test_double_rotation_cancels() {
        // A flag toggled twice projects exactly like an unrotated crop.
        let spans = vec![span("h", 0.1, 0.3)];
        let mut rotated = false;
        rotated = !rotated;
        rotated = !rotated;

        let plain = project_character_boxes(&region(), &spans, false);
        let toggled = project_character_boxes(&region(), &spans, rotated);
        assert_eq!(plain[0].points, toggled[0].points);
    }

    #[test]
    fn test_collapsed_spans_dropped() {
        let spans = vec![span("x", 0.5, 0.500_05), span("y", 0.6, 0.8)];
        let boxes = project_character_boxes(&region(), &spans, false);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].text, "y");
    }

    #[test]
    fn test_offer_quick_candidate_filters_and_halts() {
        let mut candidates = Vec::new();
        assert!(!offer_quick_candidate(&mut candidates, region(), 0.95));
        assert!(!offer_quick_candidate(&mut candidates, region(), 0.8));
        assert!(!offer_quick_candidate(&mut candidates, region(), 0.92));
        assert!(offer_quick_candidate(&mut candidates, region(), 0.91));
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_quick_check_short_circuits() {
        let candidates = vec![(region(), 0.95), (region(), 0.92)];
        let mut calls = 0;
        let report = run_quick_check(&candidates, |_| {
            calls += 1;
            Ok(RecognitionResult {
                text: "hi".to_string(),
                confidence: 0.85,
                characters: Vec::new(),
            })
        })
        .unwrap();

        assert!(report.has_text);
        assert!(report.detector_hit);
        assert_eq!(report.examined_candidates, 2);
        assert_eq!(report.evaluated_candidates, 1);
        assert_eq!(calls, 1);
        assert!((report.best_recognition_score - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_quick_check_no_candidates() {
        let report = run_quick_check(&[], |_| Ok(RecognitionResult::default())).unwrap();
        assert!(!report.has_text);
        assert!(!report.detector_hit);
        assert_eq!(report.evaluated_candidates, 0);
    }

    #[test]
    fn test_quick_check_empty_text_never_passes() {
        // High confidence but empty text must not count as a hit.
        let candidates = vec![(region(), 0.95)];
        let report = run_quick_check(&candidates, |_| {
            Ok(RecognitionResult {
                text: String::new(),
                confidence: 0.99,
                characters: Vec::new(),
            })
        })
        .unwrap();
        assert!(!report.has_text);
        assert_eq!(report.evaluated_candidates, 1);
    }

    #[test]
    fn test_crop_text_region_dimensions() {
        let img = RgbaImage::from_pixel(200, 100, image::Rgba([255, 255, 255, 255]));
        let text_box = TextBox::new([
            Point::new(10.0, 10.0),
            Point::new(90.0, 10.0),
            Point::new(90.0, 40.0),
            Point::new(10.0, 40.0),
        ]);

        let crop = crop_text_region(&img, &text_box).unwrap();
        assert_eq!(crop.dimensions(), (80, 30));
    }

    #[test]
    fn test_crop_text_region_rotates_tall_regions() {
        let img = RgbaImage::from_pixel(200, 200, image::Rgba([255, 255, 255, 255]));
        let text_box = TextBox::new([
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
            Point::new(30.0, 110.0),
            Point::new(10.0, 110.0),
        ]);

        let crop = crop_text_region(&img, &text_box).unwrap();
        // 20x100 region is laid on its side.
        assert_eq!(crop.dimensions(), (100, 20));
    }
}
