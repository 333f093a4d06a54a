//! Geometric primitives for OCR processing.
//!
//! This module provides the point, rectangle, and oriented-quadrilateral
//! types used across the pipeline, together with the polygon algorithms the
//! detection post-processor is built from: convex hull, minimum-area
//! rectangle, outward polygon offsetting, and point-in-quad tests.
//!
//! All routines here are value-in value-out and return empty collections for
//! degenerate inputs (fewer than 3 hull points, zero-length edges, zero
//! perimeter) so a single malformed region cannot abort a pipeline run.

use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates, in original-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned bounding box derived from a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X-coordinate of the left edge.
    pub left: f32,
    /// Y-coordinate of the top edge.
    pub top: f32,
    /// X-coordinate of the right edge.
    pub right: f32,
    /// Y-coordinate of the bottom edge.
    pub bottom: f32,
}

impl Rect {
    /// Computes the axis-aligned bounding box of a point set.
    ///
    /// # Arguments
    ///
    /// * `points` - The points to enclose.
    ///
    /// # Returns
    ///
    /// The bounding rectangle, or a zero rectangle for an empty input.
    pub fn bounding(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self {
                left: 0.0,
                top: 0.0,
                right: 0.0,
                bottom: 0.0,
            };
        }
        let mut rect = Self {
            left: f32::INFINITY,
            top: f32::INFINITY,
            right: f32::NEG_INFINITY,
            bottom: f32::NEG_INFINITY,
        };
        for p in points {
            rect.left = rect.left.min(p.x);
            rect.top = rect.top.min(p.y);
            rect.right = rect.right.max(p.x);
            rect.bottom = rect.bottom.max(p.y);
        }
        rect
    }

    /// Width of the rectangle.
    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the rectangle.
    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// An oriented quadrilateral: exactly four corners, clockwise from top-left.
///
/// The corner ordering is a class invariant: both constructors run the
/// points through [`order_points_clockwise`], so a `TextBox` read back out
/// always starts at the corner with the smallest `x + y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    points: [Point; 4],
}

impl TextBox {
    /// Creates a text box from four corners, restoring clockwise order.
    pub fn new(points: [Point; 4]) -> Self {
        let ordered = order_points_clockwise(&points);
        Self {
            points: [ordered[0], ordered[1], ordered[2], ordered[3]],
        }
    }

    /// Creates a text box from a polygon, which must have exactly four vertices.
    ///
    /// # Arguments
    ///
    /// * `polygon` - The candidate corner set.
    ///
    /// # Returns
    ///
    /// `Some(TextBox)` when the polygon has exactly 4 points, `None` otherwise.
    pub fn from_polygon(polygon: &[Point]) -> Option<Self> {
        if polygon.len() != 4 {
            return None;
        }
        Some(Self::new([polygon[0], polygon[1], polygon[2], polygon[3]]))
    }

    /// The four corners, clockwise from top-left.
    #[inline]
    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    /// The minimum x-coordinate over the four corners.
    pub fn min_x(&self) -> f32 {
        self.points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min)
    }

    /// The minimum y-coordinate over the four corners.
    pub fn min_y(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    /// The axis-aligned bounding rectangle of the box.
    pub fn bounding_rect(&self) -> Rect {
        Rect::bounding(&self.points)
    }

    /// Edge lengths as (top, right, bottom, left), following the corner order.
    pub fn edge_lengths(&self) -> (f32, f32, f32, f32) {
        let [tl, tr, br, bl] = &self.points;
        (
            tl.distance(tr),
            tr.distance(br),
            br.distance(bl),
            bl.distance(tl),
        )
    }
}

/// Cross product of the vectors `o -> a` and `o -> b`.
///
/// A positive value indicates a counter-clockwise turn, a negative value a
/// clockwise turn, and zero collinearity.
#[inline]
fn cross(o: &Point, a: &Point, b: &Point) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Signed area of a polygon via the shoelace formula.
///
/// With image coordinates (y growing downward), a visually clockwise ring
/// yields a positive value.
pub fn polygon_signed_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Perimeter of a closed polygon.
pub fn polygon_perimeter(points: &[Point]) -> f32 {
    let n = points.len();
    let mut perimeter = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        perimeter += points[i].distance(&points[j]);
    }
    perimeter
}

/// Orders exactly four points clockwise starting from the top-left corner.
///
/// The points are sorted by angle around their centroid; the corner with the
/// minimum `x + y` is chosen as top-left and the cyclic list is rotated so it
/// comes first. Inputs of any other length are returned unchanged.
///
/// # Arguments
///
/// * `points` - The candidate corner set.
///
/// # Returns
///
/// A vector with the four corners in clockwise order, or a copy of the input
/// when it does not hold exactly four points.
pub fn order_points_clockwise(points: &[Point]) -> Vec<Point> {
    if points.len() != 4 {
        return points.to_vec();
    }

    let cx = points.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        let angle_a = f32::atan2(a.y - cy, a.x - cx);
        let angle_b = f32::atan2(b.y - cy, b.x - cx);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut start = 0;
    let mut best = f32::INFINITY;
    for (i, p) in sorted.iter().enumerate() {
        let score = p.x + p.y;
        if score < best {
            best = score;
            start = i;
        }
    }

    (0..4).map(|i| sorted[(start + i) % 4]).collect()
}

/// Computes the convex hull of a point set with Andrew's monotone chain.
///
/// Points are sorted lexicographically by `(x, y)`; the lower and upper
/// chains accept only strictly positive turns, so collinear points never
/// produce redundant hull vertices. Inputs with fewer than 3 points are
/// returned as-is.
///
/// # Arguments
///
/// * `points` - The points to wrap.
///
/// # Returns
///
/// The hull vertices as a closed ring without redundant vertices.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Computes the corners of the minimum-area rectangle enclosing a point set.
///
/// The rectangle is found by projecting the convex hull onto the direction
/// and normal of every hull edge and keeping the smallest enclosing area
/// whose width and height both exceed `1e-3`. When the caller already holds
/// a convex ring it can skip the hull computation.
///
/// # Arguments
///
/// * `points` - The points to enclose.
/// * `points_are_convex` - Set when `points` is already a convex ring.
///
/// # Returns
///
/// Four unordered rectangle corners. If no edge yields a valid rectangle the
/// axis-aligned bounding box corners are returned instead; an empty input
/// yields an empty vector.
pub fn min_area_rect(points: &[Point], points_are_convex: bool) -> Vec<Point> {
    if points.is_empty() {
        return Vec::new();
    }

    let hull_storage;
    let hull: &[Point] = if points_are_convex {
        points
    } else {
        hull_storage = convex_hull(points);
        &hull_storage
    };

    let mut best_area = f32::MAX;
    let mut best: Option<Vec<Point>> = None;

    let n = hull.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let edge_x = hull[j].x - hull[i].x;
        let edge_y = hull[j].y - hull[i].y;
        let edge_len = (edge_x * edge_x + edge_y * edge_y).sqrt();
        if edge_len < f32::EPSILON {
            continue;
        }

        let nx = edge_x / edge_len;
        let ny = edge_y / edge_len;
        let px = -ny;
        let py = nx;

        let mut min_n = f32::MAX;
        let mut max_n = f32::MIN;
        let mut min_p = f32::MAX;
        let mut max_p = f32::MIN;
        for point in hull {
            let proj_n = nx * (point.x - hull[i].x) + ny * (point.y - hull[i].y);
            let proj_p = px * (point.x - hull[i].x) + py * (point.y - hull[i].y);
            min_n = min_n.min(proj_n);
            max_n = max_n.max(proj_n);
            min_p = min_p.min(proj_p);
            max_p = max_p.max(proj_p);
        }

        let width = max_n - min_n;
        let height = max_p - min_p;
        if width <= 1e-3 || height <= 1e-3 {
            continue;
        }

        let area = width * height;
        if area < best_area {
            best_area = area;
            let corner = |pn: f32, pp: f32| {
                Point::new(
                    hull[i].x + pn * nx + pp * px,
                    hull[i].y + pn * ny + pp * py,
                )
            };
            best = Some(vec![
                corner(min_n, min_p),
                corner(max_n, min_p),
                corner(max_n, max_p),
                corner(min_n, max_p),
            ]);
        }
    }

    best.unwrap_or_else(|| {
        let rect = Rect::bounding(points);
        vec![
            Point::new(rect.left, rect.top),
            Point::new(rect.right, rect.top),
            Point::new(rect.right, rect.bottom),
            Point::new(rect.left, rect.bottom),
        ]
    })
}

/// Offsets a polygon outward by a fixed distance.
///
/// For every vertex the unit tangents of the incoming and outgoing edges are
/// computed, their outward normals derived from the polygon's orientation
/// (via signed area), both edges shifted along their normals, and the new
/// vertex placed at the intersection of the two shifted lines. Parallel
/// edges degrade to the vertex's own offset point.
///
/// # Arguments
///
/// * `polygon` - The ring to expand.
/// * `offset` - The outward distance, in the same units as the coordinates.
///
/// # Returns
///
/// The expanded ring, or an empty vector when the input has fewer than 3
/// vertices or contains a zero-length edge.
pub fn offset_polygon(polygon: &[Point], offset: f32) -> Vec<Point> {
    let n = polygon.len();
    if n < 3 {
        return Vec::new();
    }

    // Positive shoelace area means a visually clockwise ring in image
    // coordinates; its outward normals are (dy, -dx).
    let orientation = if polygon_signed_area(polygon) >= 0.0 {
        1.0
    } else {
        -1.0
    };

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &polygon[(i + n - 1) % n];
        let curr = &polygon[i];
        let next = &polygon[(i + 1) % n];

        let in_len = prev.distance(curr);
        let out_len = curr.distance(next);
        if in_len < f32::EPSILON || out_len < f32::EPSILON {
            return Vec::new();
        }

        let t_in = ((curr.x - prev.x) / in_len, (curr.y - prev.y) / in_len);
        let t_out = ((next.x - curr.x) / out_len, (next.y - curr.y) / out_len);

        let n_in = (orientation * t_in.1, -orientation * t_in.0);
        let n_out = (orientation * t_out.1, -orientation * t_out.0);

        // Anchor points on each shifted edge.
        let a_in = Point::new(curr.x + offset * n_in.0, curr.y + offset * n_in.1);
        let a_out = Point::new(curr.x + offset * n_out.0, curr.y + offset * n_out.1);

        let denom = t_in.0 * t_out.1 - t_in.1 * t_out.0;
        if denom.abs() < 1e-6 {
            result.push(a_in);
            continue;
        }

        let dx = a_out.x - a_in.x;
        let dy = a_out.y - a_in.y;
        let s = (dx * t_out.1 - dy * t_out.0) / denom;
        result.push(Point::new(a_in.x + s * t_in.0, a_in.y + s * t_in.1));
    }

    result
}

/// Expands a detection rectangle by the DB unclip rule.
///
/// The offset distance is `|area| * ratio / perimeter`. A zero-perimeter
/// input yields an empty vector; a zero offset returns the polygon
/// unchanged.
///
/// # Arguments
///
/// * `polygon` - The ring to expand.
/// * `ratio` - The unclip ratio.
///
/// # Returns
///
/// The expanded ring.
pub fn unclip_box(polygon: &[Point], ratio: f32) -> Vec<Point> {
    let perimeter = polygon_perimeter(polygon);
    if perimeter <= f32::EPSILON {
        return Vec::new();
    }

    let offset = polygon_signed_area(polygon).abs() * ratio / perimeter;
    if offset == 0.0 {
        return polygon.to_vec();
    }

    offset_polygon(polygon, offset)
}

/// Tests whether a point lies inside (or on the boundary of) a convex quad.
///
/// The sign of the cross product along every edge must not change.
///
/// # Arguments
///
/// * `x` - X-coordinate of the probe point.
/// * `y` - Y-coordinate of the probe point.
/// * `quad` - The four corners of the quadrilateral.
///
/// # Returns
///
/// `true` when the point is inside or on an edge.
pub fn is_point_inside_quad(x: f32, y: f32, quad: &[Point]) -> bool {
    if quad.len() != 4 {
        return false;
    }

    let probe = Point::new(x, y);
    let mut has_pos = false;
    let mut has_neg = false;
    for i in 0..4 {
        let j = (i + 1) % 4;
        let c = cross(&quad[i], &quad[j], &probe);
        if c > 0.0 {
            has_pos = true;
        } else if c < 0.0 {
            has_neg = true;
        }
        if has_pos && has_neg {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_points_clockwise_starts_top_left() {
        let points = vec![
            Point::new(10.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        ];
        let ordered = order_points_clockwise(&points);

        assert_eq!(ordered[0], Point::new(0.0, 0.0));
        assert_eq!(ordered[1], Point::new(10.0, 0.0));
        assert_eq!(ordered[2], Point::new(10.0, 5.0));
        assert_eq!(ordered[3], Point::new(0.0, 5.0));
        // Clockwise in image coordinates means a positive shoelace area.
        assert!(polygon_signed_area(&ordered) > 0.0);
    }

    #[test]
    fn test_order_points_clockwise_any_permutation() {
        let base = [
            Point::new(2.0, 1.0),
            Point::new(9.0, 2.0),
            Point::new(8.0, 7.0),
            Point::new(1.0, 6.0),
        ];
        let permutations = [[0, 1, 2, 3], [3, 1, 0, 2], [2, 0, 3, 1], [1, 3, 2, 0]];
        for perm in permutations {
            let shuffled: Vec<Point> = perm.iter().map(|&i| base[i]).collect();
            let ordered = order_points_clockwise(&shuffled);
            assert!(polygon_signed_area(&ordered) > 0.0);
            let min_sum = base.iter().map(|p| p.x + p.y).fold(f32::INFINITY, f32::min);
            assert_eq!(ordered[0].x + ordered[0].y, min_sum);
        }
    }

    #[test]
    fn test_order_points_other_lengths_unchanged() {
        let points = vec![Point::new(3.0, 4.0), Point::new(1.0, 2.0)];
        assert_eq!(order_points_clockwise(&points), points);
    }

    #[test]
    fn test_convex_hull_contains_all_points() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
            Point::new(2.0, 2.0),
            Point::new(1.0, 3.0),
            Point::new(3.0, 1.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);

        // Every input point must lie inside or on the hull: no point may be
        // strictly outside any hull edge.
        let n = hull.len();
        for p in &points {
            for i in 0..n {
                let j = (i + 1) % n;
                assert!(cross(&hull[i], &hull[j], p) >= -1e-4);
            }
        }
    }

    #[test]
    fn test_convex_hull_rejects_collinear() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let hull = convex_hull(&points);
        // The midpoint on the bottom edge must not survive.
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point::new(1.0, 0.0)));
    }

    #[test]
    fn test_convex_hull_small_inputs() {
        let points = vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
        assert_eq!(convex_hull(&points), points);
    }

    #[test]
    fn test_min_area_rect_of_rotated_square() {
        // A unit square rotated 45 degrees; the minimum-area rectangle must
        // recover its area, while the axis-aligned box would double it.
        let points = vec![
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(1.0, 2.0),
        ];
        let rect = min_area_rect(&points, false);
        assert_eq!(rect.len(), 4);
        let area = polygon_signed_area(&rect).abs();
        assert!((area - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_min_area_rect_degenerate_falls_back_to_aabb() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
        ];
        let rect = min_area_rect(&points, false);
        assert_eq!(rect.len(), 4);
        let bounds = Rect::bounding(&rect);
        assert_eq!(bounds.left, 0.0);
        assert_eq!(bounds.right, 10.0);
    }

    #[test]
    fn test_unclip_box_expands_square() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        // offset = 16 * 1.5 / 16 = 1.5, so every side moves out by 1.5.
        let expanded = unclip_box(&square, 1.5);
        assert_eq!(expanded.len(), 4);
        let bounds = Rect::bounding(&expanded);
        assert!((bounds.left + 1.5).abs() < 1e-4);
        assert!((bounds.right - 5.5).abs() < 1e-4);
        assert!((bounds.top + 1.5).abs() < 1e-4);
        assert!((bounds.bottom - 5.5).abs() < 1e-4);
    }

    #[test]
    fn test_unclip_box_zero_perimeter() {
        let degenerate = vec![
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
        ];
        assert!(unclip_box(&degenerate, 1.5).is_empty());
    }

    #[test]
    fn test_offset_polygon_orientation_independent() {
        let clockwise = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let counter: Vec<Point> = clockwise.iter().rev().copied().collect();

        let a = Rect::bounding(&offset_polygon(&clockwise, 1.0));
        let b = Rect::bounding(&offset_polygon(&counter, 1.0));
        assert!((a.left - b.left).abs() < 1e-4);
        assert!((a.right - b.right).abs() < 1e-4);
    }

    #[test]
    fn test_is_point_inside_quad() {
        let quad = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(is_point_inside_quad(5.0, 5.0, &quad));
        assert!(is_point_inside_quad(0.0, 0.0, &quad));
        assert!(!is_point_inside_quad(10.5, 5.0, &quad));
        assert!(!is_point_inside_quad(-0.5, 5.0, &quad));
    }

    #[test]
    fn test_text_box_restores_order() {
        let unordered = [
            Point::new(10.0, 5.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 0.0),
        ];
        let text_box = TextBox::new(unordered);
        let points = text_box.points();
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[2], Point::new(10.0, 5.0));

        let rect = text_box.bounding_rect();
        assert_eq!(rect.width(), 10.0);
        assert_eq!(rect.height(), 5.0);
    }

    #[test]
    fn test_text_box_edge_lengths() {
        let text_box = TextBox::new([
            Point::new(0.0, 0.0),
            Point::new(8.0, 0.0),
            Point::new(8.0, 2.0),
            Point::new(0.0, 2.0),
        ]);
        let (top, right, bottom, left) = text_box.edge_lengths();
        assert_eq!(top, 8.0);
        assert_eq!(bottom, 8.0);
        assert_eq!(left, 2.0);
        assert_eq!(right, 2.0);
    }
}
