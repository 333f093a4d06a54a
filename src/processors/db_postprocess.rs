//! Post-processing for DB (Differentiable Binarization) text detection.
//!
//! The [`DBPostProcess`] struct converts the raw detection probability map
//! into oriented quadrilaterals: the map is binarized, connected components
//! are extracted and wrapped in convex hulls, each hull's minimum-area
//! rectangle is scored against the probability map, surviving rectangles are
//! expanded (unclipped) to recover the extent shrunk by the DB training
//! target, and the result is scaled back to original-image coordinates.
//!
//! Accepted boxes are streamed through a caller-supplied sink; returning
//! `true` from the sink halts further emission, which lets the detect-all
//! and detect-top-K paths share this code without re-running the model.

use crate::core::{constants, Tensor2D};
use crate::processors::geometry::{
    convex_hull, is_point_inside_quad, min_area_rect, unclip_box, Point, TextBox,
};
use crate::processors::resize::DetScale;
use itertools::Itertools;
use tracing::debug;

/// Post-processor for DB text detection models.
#[derive(Debug)]
pub struct DBPostProcess {
    /// Threshold for binarizing the prediction map.
    pub thresh: f32,
    /// Minimum mean probability inside a candidate rectangle.
    pub box_thresh: f32,
    /// Maximum number of connected components to consider.
    pub max_candidates: usize,
    /// Ratio for unclipping (expanding) rectangles.
    pub unclip_ratio: f32,
    /// Minimum shorter side of an expanded rectangle, in resized-image pixels.
    pub min_size: f32,
}

impl Default for DBPostProcess {
    fn default() -> Self {
        Self {
            thresh: constants::DET_THRESH,
            box_thresh: constants::DET_BOX_THRESH,
            max_candidates: constants::DET_MAX_CANDIDATES,
            unclip_ratio: constants::DET_UNCLIP_RATIO,
            min_size: constants::DET_MIN_SIZE,
        }
    }
}

impl DBPostProcess {
    /// Creates a new DBPostProcess with the pipeline's default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a probability map into oriented text boxes.
    ///
    /// Each accepted box is passed to `emit` together with its score;
    /// returning `true` from the sink stops the scan.
    ///
    /// # Arguments
    ///
    /// * `pred` - The `[H', W']` probability map from the detection model.
    /// * `scale` - Scale information mapping back to original coordinates.
    /// * `emit` - Sink receiving `(box, score)` pairs.
    pub fn apply<F>(&self, pred: &Tensor2D, scale: &DetScale, mut emit: F)
    where
        F: FnMut(TextBox, f32) -> bool,
    {
        let height = pred.shape()[0];
        let width = pred.shape()[1];
        if height == 0 || width == 0 {
            return;
        }

        let mut binary = vec![false; height * width];
        for y in 0..height {
            for x in 0..width {
                binary[y * width + x] = pred[[y, x]] > self.thresh;
            }
        }

        let mut components = connected_components(&binary, width, height);
        components.retain(|c| c.len() >= 4);
        components.sort_by(|a, b| b.len().cmp(&a.len()));
        components.truncate(self.max_candidates);

        debug!(candidates = components.len(), "detection components extracted");

        for component in &components {
            let centers: Vec<Point> = component
                .iter()
                .map(|&(x, y)| Point::new(x as f32 + 0.5, y as f32 + 0.5))
                .collect();

            let hull = convex_hull(&centers);
            if hull.len() < 3 {
                continue;
            }

            let rect = min_area_rect(&hull, true);
            let score = self.box_score(pred, &rect, width, height);
            if score < self.box_thresh {
                continue;
            }

            let expanded = unclip_box(&rect, self.unclip_ratio);
            if expanded.is_empty() {
                continue;
            }

            let final_rect = min_area_rect(&expanded, false);
            if final_rect.len() != 4 {
                continue;
            }

            let side_a = final_rect[0].distance(&final_rect[1]);
            let side_b = final_rect[1].distance(&final_rect[2]);
            if side_a.min(side_b) < self.min_size {
                continue;
            }

            let scaled: Vec<Point> = final_rect
                .iter()
                .map(|p| {
                    Point::new(
                        p.x.clamp(0.0, scale.resized_w as f32) * scale.ratio_w(),
                        p.y.clamp(0.0, scale.resized_h as f32) * scale.ratio_h(),
                    )
                })
                .collect();

            let Some(text_box) = TextBox::from_polygon(&scaled) else {
                continue;
            };

            if emit(text_box, score) {
                return;
            }
        }
    }

    /// Mean probability over pixels whose center lies inside the rectangle.
    ///
    /// Returns 0 when no pixel center qualifies.
    fn box_score(&self, pred: &Tensor2D, rect: &[Point], width: usize, height: usize) -> f32 {
        if rect.len() != 4 {
            return 0.0;
        }

        let Some((min_x, max_x)) = rect.iter().map(|p| p.x).minmax().into_option() else {
            return 0.0;
        };
        let Some((min_y, max_y)) = rect.iter().map(|p| p.y).minmax().into_option() else {
            return 0.0;
        };

        let start_x = min_x.floor().max(0.0) as usize;
        let end_x = (max_x.ceil() as usize + 1).min(width);
        let start_y = min_y.floor().max(0.0) as usize;
        let end_y = (max_y.ceil() as usize + 1).min(height);

        let mut total = 0.0;
        let mut count = 0usize;
        for y in start_y..end_y {
            for x in start_x..end_x {
                if is_point_inside_quad(x as f32 + 0.5, y as f32 + 0.5, rect) {
                    total += pred[[y, x]];
                    count += 1;
                }
            }
        }

        if count > 0 {
            total / count as f32
        } else {
            0.0
        }
    }
}

/// Extracts 8-connected components from a binary map with an iterative DFS.
///
/// # Arguments
///
/// * `binary` - Row-major binary map.
/// * `width` - Map width.
/// * `height` - Map height.
///
/// # Returns
///
/// One `(x, y)` pixel list per component.
fn connected_components(binary: &[bool], width: usize, height: usize) -> Vec<Vec<(u32, u32)>> {
    let mut visited = vec![false; binary.len()];
    let mut components = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start_y in 0..height {
        for start_x in 0..width {
            let start_idx = start_y * width + start_x;
            if !binary[start_idx] || visited[start_idx] {
                continue;
            }

            let mut component = Vec::new();
            visited[start_idx] = true;
            stack.push((start_x, start_y));

            while let Some((x, y)) = stack.pop() {
                component.push((x as u32, y as u32));

                let x_lo = x.saturating_sub(1);
                let y_lo = y.saturating_sub(1);
                let x_hi = (x + 1).min(width - 1);
                let y_hi = (y + 1).min(height - 1);
                for ny in y_lo..=y_hi {
                    for nx in x_lo..=x_hi {
                        let idx = ny * width + nx;
                        if binary[idx] && !visited[idx] {
                            visited[idx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            components.push(component);
        }
    }

    components
}
