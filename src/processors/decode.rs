//! CTC decoding for text recognition.
//!
//! This module turns the recognition model's per-timestep class
//! distributions into text: a greedy argmax over the vocabulary, blank
//! skipping, run collapse, and per-character span tracking along the
//! recognition strip so characters can later be projected back onto the
//! original image.
//!
//! The vocabulary layout is fixed by the model contract: class 0 is the CTC
//! blank and is never emitted; see [`crate::utils::dict`].

use crate::core::{constants, Tensor3D};
use ndarray::ArrayView2;
use tracing::debug;

/// One decoded character together with its position along the strip.
///
/// `start_ratio` and `end_ratio` are fractions of the crop's content width,
/// not of the padded batch strip.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSpan {
    /// The decoded token.
    pub text: String,
    /// Mean probability over the collapsed run.
    pub confidence: f32,
    /// Fractional start of the run along the content region.
    pub start_ratio: f32,
    /// Fractional end of the run along the content region.
    pub end_ratio: f32,
}

/// The decoded output for one recognition crop.
#[derive(Debug, Clone, Default)]
pub struct RecognitionResult {
    /// Concatenation of the decoded tokens; possibly empty.
    pub text: String,
    /// Mean per-character confidence; 0 when no characters decoded.
    pub confidence: f32,
    /// The decoded characters with their spans.
    pub characters: Vec<CharacterSpan>,
}

/// A greedy CTC decoder over a fixed vocabulary.
#[derive(Debug)]
pub struct CTCLabelDecode {
    characters: Vec<String>,
}

impl CTCLabelDecode {
    /// Creates a decoder over the given vocabulary.
    ///
    /// # Arguments
    ///
    /// * `characters` - The vocabulary; index 0 must be the blank token.
    pub fn new(characters: Vec<String>) -> Self {
        Self { characters }
    }

    /// Number of tokens in the vocabulary, blank included.
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Decodes a whole recognition batch.
    ///
    /// # Arguments
    ///
    /// * `pred` - The `[N, T, V]` model output.
    /// * `content_widths` - Per-item content width inside the padded strip.
    /// * `packed_width` - The batch's shared packed width.
    ///
    /// # Returns
    ///
    /// One recognition result per batch item, in batch order.
    pub fn apply(
        &self,
        pred: &Tensor3D,
        content_widths: &[u32],
        packed_width: u32,
    ) -> Vec<RecognitionResult> {
        let batch_size = pred.shape()[0];
        let mut results = Vec::with_capacity(batch_size);

        for batch_idx in 0..batch_size {
            let logits = pred.index_axis(ndarray::Axis(0), batch_idx);
            let content_width = content_widths.get(batch_idx).copied().unwrap_or(packed_width);
            results.push(self.decode_item(logits, content_width, packed_width));
        }

        debug!(
            batch_size,
            decoded = results.iter().filter(|r| !r.text.is_empty()).count(),
            "ctc decode"
        );

        results
    }

    /// Decodes a single `[T, V]` sequence.
    ///
    /// Timesteps are collapsed into runs of identical non-blank classes;
    /// each run becomes one character whose confidence is the mean of the
    /// per-step maximum probabilities. Span ratios are expressed relative to
    /// the content region by scaling with `packed_width / content_width`,
    /// clamped so `0 <= start <= end <= 1` and each span keeps a minimum
    /// width of `max(1e-3, scale / T)`.
    ///
    /// # Arguments
    ///
    /// * `logits` - The per-timestep class distributions.
    /// * `content_width` - The item's content width in pixels.
    /// * `packed_width` - The batch's packed width in pixels.
    ///
    /// # Returns
    ///
    /// The decoded result; empty text with confidence 0 when nothing decodes.
    pub fn decode_item(
        &self,
        logits: ArrayView2<f32>,
        content_width: u32,
        packed_width: u32,
    ) -> RecognitionResult {
        let timesteps = logits.shape()[0];
        if timesteps == 0 {
            return RecognitionResult::default();
        }

        let mut best_classes = Vec::with_capacity(timesteps);
        let mut best_probs = Vec::with_capacity(timesteps);
        for row in logits.outer_iter() {
            let mut best_idx = 0usize;
            let mut best_prob = f32::NEG_INFINITY;
            for (idx, &prob) in row.iter().enumerate() {
                if prob > best_prob {
                    best_prob = prob;
                    best_idx = idx;
                }
            }
            best_classes.push(best_idx);
            best_probs.push(best_prob);
        }

        let scale = if content_width == 0 {
            1.0
        } else {
            (packed_width as f32 / content_width as f32).max(1.0)
        };
        let min_span = constants::MIN_CHAR_SPAN_RATIO.max(scale / timesteps as f32);

        let mut characters = Vec::new();
        let mut text = String::new();

        let mut t = 0;
        while t < timesteps {
            let class = best_classes[t];
            let run_start = t;
            while t < timesteps && best_classes[t] == class {
                t += 1;
            }
            let run_end = t - 1;

            if class == 0 {
                continue;
            }
            // Out-of-range class indices are dropped silently.
            let Some(token) = self.characters.get(class) else {
                continue;
            };

            let run_probs = &best_probs[run_start..=run_end];
            let confidence = run_probs.iter().sum::<f32>() / run_probs.len() as f32;

            let mut start = (run_start as f32 / timesteps as f32) * scale;
            let mut end = (run_end as f32 / timesteps as f32) * scale;
            start = start.clamp(0.0, 1.0);
            end = end.clamp(start, 1.0);
            if end - start < min_span {
                end = (start + min_span).min(1.0);
                if end - start < min_span {
                    start = (end - min_span).max(0.0);
                }
            }

            text.push_str(token);
            characters.push(CharacterSpan {
                text: token.clone(),
                confidence,
                start_ratio: start,
                end_ratio: end,
            });
        }

        let confidence = if characters.is_empty() {
            0.0
        } else {
            characters.iter().map(|c| c.confidence).sum::<f32>() / characters.len() as f32
        };

        RecognitionResult {
            text,
            confidence,
            characters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Builds [T, V] logits where each timestep puts `prob` on `class`.
    fn logits_from(sequence: &[(usize, f32)], vocab: usize) -> Array2<f32> {
        let mut logits = Array2::zeros((sequence.len(), vocab));
        for (t, &(class, prob)) in sequence.iter().enumerate() {
            logits[[t, class]] = prob;
            // Spread a sliver of mass elsewhere so argmax is unambiguous.
            for v in 0..vocab {
                if v != class {
                    logits[[t, v]] = (1.0 - prob) / (vocab - 1) as f32;
                }
            }
        }
        logits
    }

    fn decoder() -> CTCLabelDecode {
        // Blank, "A", "B", space -- the layout utils::dict produces.
        CTCLabelDecode::new(vec![
            String::new(),
            "A".to_string(),
            "B".to_string(),
            " ".to_string(),
        ])
    }

    #[test]
    fn test_ctc_collapse() {
        let decode = decoder();
        let logits = logits_from(
            &[
                (0, 0.9),
                (1, 0.8),
                (1, 0.9),
                (1, 0.7),
                (0, 0.9),
                (2, 0.6),
                (0, 0.9),
            ],
            4,
        );

        let result = decode.decode_item(logits.view(), 320, 320);
        assert_eq!(result.text, "AB");
        assert_eq!(result.characters.len(), 2);
        assert!((result.characters[0].confidence - 0.8).abs() < 1e-5);
        assert!((result.characters[1].confidence - 0.6).abs() < 1e-5);
        assert!((result.confidence - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_span_monotonicity_and_min_width() {
        let decode = decoder();
        let logits = logits_from(
            &[
                (1, 0.9),
                (0, 0.9),
                (2, 0.9),
                (0, 0.9),
                (1, 0.9),
                (2, 0.9),
            ],
            4,
        );

        let result = decode.decode_item(logits.view(), 320, 320);
        assert_eq!(result.text, "ABAB");

        let mut prev_start = -1.0;
        for span in &result.characters {
            assert!(span.start_ratio >= prev_start);
            assert!(span.end_ratio >= span.start_ratio);
            assert!(span.end_ratio - span.start_ratio >= 1e-3);
            assert!(span.start_ratio >= 0.0 && span.end_ratio <= 1.0);
            prev_start = span.start_ratio;
        }
    }

    #[test]
    fn test_spans_rescale_to_content_region() {
        let decode = decoder();
        // One character in the middle of an 8-step strip.
        let logits = logits_from(
            &[
                (0, 0.9),
                (0, 0.9),
                (0, 0.9),
                (1, 0.9),
                (0, 0.9),
                (0, 0.9),
                (0, 0.9),
                (0, 0.9),
            ],
            4,
        );

        // Content fills half the packed strip, so ratios double.
        let padded = decode.decode_item(logits.view(), 160, 320);
        let full = decode.decode_item(logits.view(), 320, 320);
        assert!(
            (padded.characters[0].start_ratio - 2.0 * full.characters[0].start_ratio).abs() < 1e-4
        );
    }

    #[test]
    fn test_blank_only_sequence_is_empty() {
        let decode = decoder();
        let logits = logits_from(&[(0, 0.9), (0, 0.9), (0, 0.9)], 4);
        let result = decode.decode_item(logits.view(), 320, 320);
        assert!(result.text.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert!(result.characters.is_empty());
    }

    #[test]
    fn test_out_of_range_class_dropped() {
        // Vocabulary of 4 tokens but 6 model classes.
        let decode = decoder();
        let logits = logits_from(&[(5, 0.9), (1, 0.9)], 6);
        let result = decode.decode_item(logits.view(), 320, 320);
        assert_eq!(result.text, "A");
        assert_eq!(result.characters.len(), 1);
    }

    #[test]
    fn test_batch_order_preserved() {
        let decode = decoder();
        let mut pred = ndarray::Array3::zeros((2, 2, 4));
        // Item 0 says "A", item 1 says "B".
        pred[[0, 0, 1]] = 0.9;
        pred[[0, 1, 0]] = 0.9;
        pred[[1, 0, 2]] = 0.9;
        pred[[1, 1, 0]] = 0.9;

        let results = decode.apply(&pred, &[320, 320], 320);
        assert_eq!(results[0].text, "A");
        assert_eq!(results[1].text, "B");
    }
}
