//! Perspective transformation utilities for OCR processing.
//!
//! This module computes the homography between two quadrilaterals and warps
//! image regions through it, which is how oriented text regions are
//! rectified into the axis-aligned strips the recognition model consumes.

use crate::core::OCRError;
use crate::processors::geometry::Point;
use image::{imageops, Rgba, RgbaImage};
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

/// Calculates the perspective transformation matrix that maps source points
/// to destination points.
///
/// The eight homography coefficients are the solution of the linear system
/// built from the four point correspondences; it is solved with LU
/// decomposition with partial pivoting.
///
/// # Arguments
///
/// * `src_points` - Exactly 4 source points.
/// * `dst_points` - Exactly 4 destination points.
///
/// # Returns
///
/// A Result containing the 3x3 transformation matrix, or an OCRError if the
/// input is malformed or the system is singular.
pub fn get_perspective_transform(
    src_points: &[Point],
    dst_points: &[Point],
) -> Result<Matrix3<f32>, OCRError> {
    if src_points.len() != 4 || dst_points.len() != 4 {
        return Err(OCRError::InvalidInput {
            message: "need exactly 4 points for perspective transformation".to_string(),
        });
    }

    // With the homography normalized to i = 1, each correspondence
    // (x, y) -> (x', y') contributes two equations in the unknowns [a..h]:
    //   x' = (a*x + b*y + c) / (g*x + h*y + 1)
    //   y' = (d*x + e*y + f) / (g*x + h*y + 1)
    let mut coeffs = [0.0f32; 64];
    let mut rhs = [0.0f32; 8];
    for (k, (s, d)) in src_points.iter().zip(dst_points).enumerate() {
        let x_eq = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -s.x * d.x, -s.y * d.x];
        let y_eq = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -s.x * d.y, -s.y * d.y];
        coeffs[k * 16..k * 16 + 8].copy_from_slice(&x_eq);
        coeffs[k * 16 + 8..k * 16 + 16].copy_from_slice(&y_eq);
        rhs[k * 2] = d.x;
        rhs[k * 2 + 1] = d.y;
    }

    let system = nalgebra::DMatrix::from_row_slice(8, 8, &coeffs);
    let h = system
        .lu()
        .solve(&nalgebra::DVector::from_row_slice(&rhs))
        .ok_or_else(|| OCRError::InvalidInput {
            message: "cannot solve perspective transformation".to_string(),
        })?;

    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}

/// Applies a perspective transformation to an image.
///
/// Each destination pixel is mapped back through the inverse homography and
/// sampled from the source: bilinear where all four neighbors are in bounds,
/// nearest-neighbor in the one-pixel edge band, and fully transparent where
/// the sample falls outside the source. Rows are processed in parallel.
///
/// # Arguments
///
/// * `src_image` - The source image to transform.
/// * `transform_matrix` - The 3x3 perspective transformation matrix.
/// * `dst_width` - Width of the output image.
/// * `dst_height` - Height of the output image.
///
/// # Returns
///
/// A Result containing the transformed image, or an OCRError if the matrix
/// cannot be inverted.
pub fn warp_perspective(
    src_image: &RgbaImage,
    transform_matrix: &Matrix3<f32>,
    dst_width: u32,
    dst_height: u32,
) -> Result<RgbaImage, OCRError> {
    let inv_matrix = transform_matrix
        .try_inverse()
        .ok_or_else(|| OCRError::InvalidInput {
            message: "cannot invert transformation matrix".to_string(),
        })?;

    let mut dst_image = RgbaImage::new(dst_width, dst_height);
    let (src_width, src_height) = src_image.dimensions();
    let buffer: &mut [u8] = dst_image.as_mut();

    buffer
        .par_chunks_mut((dst_width * 4) as usize)
        .enumerate()
        .for_each(|(dst_y, row_buffer)| {
            for dst_x in 0..dst_width {
                let dst_point = Vector3::new(dst_x as f32, dst_y as f32, 1.0);
                let src_point = inv_matrix * dst_point;

                let mut final_pixel = Rgba([0, 0, 0, 0]);
                if src_point.z.abs() > f32::EPSILON {
                    let src_x = src_point.x / src_point.z;
                    let src_y = src_point.y / src_point.z;

                    if src_x >= 0.0
                        && src_y >= 0.0
                        && src_x < (src_width - 1) as f32
                        && src_y < (src_height - 1) as f32
                    {
                        final_pixel = bilinear_interpolate(src_image, src_x, src_y);
                    } else {
                        let nearest_x = src_x.round();
                        let nearest_y = src_y.round();
                        if nearest_x >= 0.0
                            && nearest_y >= 0.0
                            && (nearest_x as u32) < src_width
                            && (nearest_y as u32) < src_height
                        {
                            final_pixel =
                                *src_image.get_pixel(nearest_x as u32, nearest_y as u32);
                        }
                    }
                }

                let index = (dst_x * 4) as usize;
                row_buffer[index..index + 4].copy_from_slice(&final_pixel.0);
            }
        });

    Ok(dst_image)
}

/// Performs bilinear interpolation to get a pixel value at non-integer coordinates.
fn bilinear_interpolate(image: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = (x1 + 1).min(image.width() - 1);
    let y2 = (y1 + 1).min(image.height() - 1);

    let dx = x - x1 as f32;
    let dy = y - y1 as f32;

    let p11 = image.get_pixel(x1, y1);
    let p12 = image.get_pixel(x1, y2);
    let p21 = image.get_pixel(x2, y1);
    let p22 = image.get_pixel(x2, y2);

    let mut result = [0u8; 4];
    for (i, result_channel) in result.iter_mut().enumerate() {
        let val = (1.0 - dx) * (1.0 - dy) * p11.0[i] as f32
            + dx * (1.0 - dy) * p21.0[i] as f32
            + (1.0 - dx) * dy * p12.0[i] as f32
            + dx * dy * p22.0[i] as f32;
        *result_channel = val.round().clamp(0.0, 255.0) as u8;
    }

    Rgba(result)
}

/// Rotates an image by 180 degrees.
///
/// Used when the angle classifier votes that a crop is upside down.
pub fn rotate_180(image: &RgbaImage) -> RgbaImage {
    imageops::rotate180(image)
}

/// Rotates an image by 90 degrees counter-clockwise.
///
/// Used to lay suspiciously tall crops on their side before recognition.
pub fn rotate_90_ccw(image: &RgbaImage) -> RgbaImage {
    imageops::rotate270(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    fn apply(m: &Matrix3<f32>, p: &Point) -> Point {
        let v = m * Vector3::new(p.x, p.y, 1.0);
        Point::new(v.x / v.z, v.y / v.z)
    }

    #[test]
    fn test_perspective_transform_maps_corners() {
        let src = unit_square();
        let dst = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.5),
            Point::new(3.5, 3.0),
            Point::new(-0.5, 2.5),
        ];

        let m = get_perspective_transform(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let mapped = apply(&m, s);
            assert!((mapped.x - d.x).abs() < 1e-4);
            assert!((mapped.y - d.y).abs() < 1e-4);
        }
    }

    #[test]
    fn test_perspective_round_trip() {
        let src = vec![
            Point::new(3.0, 7.0),
            Point::new(42.0, 5.0),
            Point::new(40.0, 30.0),
            Point::new(1.0, 28.0),
        ];
        let dst = vec![
            Point::new(0.0, 0.0),
            Point::new(32.0, 0.0),
            Point::new(32.0, 24.0),
            Point::new(0.0, 24.0),
        ];

        let forward = get_perspective_transform(&src, &dst).unwrap();
        let backward = get_perspective_transform(&dst, &src).unwrap();

        for p in &src {
            let there = apply(&forward, p);
            let back = apply(&backward, &there);
            assert!((back.x - p.x).abs() < 1e-3);
            assert!((back.y - p.y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_perspective_transform_invalid_input() {
        let src = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let dst = unit_square();
        assert!(get_perspective_transform(&src, &dst).is_err());
    }

    #[test]
    fn test_warp_identity_preserves_pixels() {
        let mut image = RgbaImage::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                image.put_pixel(x, y, Rgba([(x * 60) as u8, (y * 60) as u8, 0, 255]));
            }
        }

        let identity = Matrix3::identity();
        let warped = warp_perspective(&image, &identity, 4, 4).unwrap();
        assert_eq!(warped.get_pixel(2, 1), image.get_pixel(2, 1));
    }

    #[test]
    fn test_warp_outside_is_transparent() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        // Shift the sampling window far outside the 2x2 source.
        let shift = Matrix3::new(1.0, 0.0, -10.0, 0.0, 1.0, -10.0, 0.0, 0.0, 1.0);
        let warped = warp_perspective(&image, &shift.try_inverse().unwrap(), 2, 2).unwrap();
        assert_eq!(warped.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_warp_singular_matrix() {
        let image = RgbaImage::new(2, 2);
        let singular = Matrix3::new(1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        assert!(warp_perspective(&image, &singular, 2, 2).is_err());
    }

    #[test]
    fn test_bilinear_interpolate_center() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        image.put_pixel(1, 1, Rgba([255, 255, 0, 255]));

        let pixel = bilinear_interpolate(&image, 0.5, 0.5);
        assert_eq!(pixel.0[0], 128);
        assert_eq!(pixel.0[1], 128);
        assert_eq!(pixel.0[2], 64);
        assert_eq!(pixel.0[3], 255);
    }

    #[test]
    fn test_rotate_180_twice_is_identity() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(0, 0, Rgba([9, 8, 7, 255]));
        let rotated = rotate_180(&rotate_180(&image));
        assert_eq!(rotated, image);
    }
}
