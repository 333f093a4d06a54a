//! Reading-order sorting for detected text boxes.
//!
//! Detected boxes are emitted from the probability map in scan order; this
//! module rearranges them into reading order: top to bottom, left to right,
//! where boxes whose top edges sit within a small vertical tolerance of each
//! other count as one text line.

use crate::core::constants::SORT_LINE_TOLERANCE;
use crate::processors::geometry::TextBox;

/// Sorts detection candidates into reading order.
///
/// Boxes are first ordered by their minimum y then minimum x; an insertion
/// pass then moves each box left past neighbors that share its line (top
/// edges within 10 px) but sit at a larger x.
///
/// # Arguments
///
/// * `candidates` - The `(box, score)` pairs to sort.
///
/// # Returns
///
/// The candidates in reading order.
pub fn sort_reading_order(mut candidates: Vec<(TextBox, f32)>) -> Vec<(TextBox, f32)> {
    candidates.sort_by(|(a, _), (b, _)| {
        let a_key = (a.min_y(), a.min_x());
        let b_key = (b.min_y(), b.min_x());
        a_key
            .partial_cmp(&b_key)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // The y-major sort can still interleave a visual line whose boxes have
    // slightly different tops; bubble each box left while it shares a line
    // with its predecessor and starts further left.
    for i in 1..candidates.len() {
        let mut j = i;
        while j > 0 {
            let prev = &candidates[j - 1].0;
            let curr = &candidates[j].0;
            let same_line = (curr.min_y() - prev.min_y()).abs() <= SORT_LINE_TOLERANCE;
            if same_line && curr.min_x() < prev.min_x() {
                candidates.swap(j - 1, j);
                j -= 1;
            } else {
                break;
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::Point;

    fn make_box(x: f32, y: f32) -> TextBox {
        TextBox::new([
            Point::new(x, y),
            Point::new(x + 30.0, y),
            Point::new(x + 30.0, y + 12.0),
            Point::new(x, y + 12.0),
        ])
    }

    #[test]
    fn test_same_line_sorted_by_x() {
        let candidates = vec![
            (make_box(20.0, 0.0), 0.9),
            (make_box(10.0, 4.0), 0.8),
            (make_box(0.0, 40.0), 0.7),
        ];

        let sorted = sort_reading_order(candidates);

        // The y=0 and y=4 boxes share a line, so x decides; the y=40 box
        // trails.
        assert_eq!(sorted[0].0.min_x(), 10.0);
        assert_eq!(sorted[1].0.min_x(), 20.0);
        assert_eq!(sorted[2].0.min_y(), 40.0);
    }

    #[test]
    fn test_distinct_lines_sorted_by_y() {
        let candidates = vec![
            (make_box(0.0, 50.0), 0.9),
            (make_box(0.0, 0.0), 0.9),
            (make_box(0.0, 25.0), 0.9),
        ];

        let sorted = sort_reading_order(candidates);
        assert_eq!(sorted[0].0.min_y(), 0.0);
        assert_eq!(sorted[1].0.min_y(), 25.0);
        assert_eq!(sorted[2].0.min_y(), 50.0);
    }

    #[test]
    fn test_scores_travel_with_boxes() {
        let candidates = vec![
            (make_box(40.0, 2.0), 0.6),
            (make_box(0.0, 0.0), 0.95),
        ];
        let sorted = sort_reading_order(candidates);
        assert_eq!(sorted[0].1, 0.95);
        assert_eq!(sorted[1].1, 0.6);
    }

    #[test]
    fn test_empty_input() {
        assert!(sort_reading_order(Vec::new()).is_empty());
    }
}
