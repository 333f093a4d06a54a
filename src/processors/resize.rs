//! Image resizing for OCR preprocessing.
//!
//! Two resize strategies are used by the pipeline: the detection model takes
//! the whole image scaled so its longer side fits a cap with both dimensions
//! legalized to multiples of 32, and the recognition and classification
//! models take crops scaled to a fixed height with width following the
//! aspect ratio up to a per-batch cap.

use image::{imageops, imageops::FilterType, RgbaImage};

/// Scale information produced by the detection resize.
///
/// Keeps the original dimensions next to the legalized ones so detected
/// boxes can be projected back into original-image coordinates.
#[derive(Debug, Clone, Copy)]
pub struct DetScale {
    /// Original image width in pixels.
    pub src_w: u32,
    /// Original image height in pixels.
    pub src_h: u32,
    /// Width fed to the detection model.
    pub resized_w: u32,
    /// Height fed to the detection model.
    pub resized_h: u32,
}

impl DetScale {
    /// Horizontal factor mapping resized coordinates back to the original image.
    pub fn ratio_w(&self) -> f32 {
        self.src_w as f32 / self.resized_w as f32
    }

    /// Vertical factor mapping resized coordinates back to the original image.
    pub fn ratio_h(&self) -> f32 {
        self.src_h as f32 / self.resized_h as f32
    }
}

/// Resizer for the detection model input.
#[derive(Debug)]
pub struct DetResize {
    /// Longer image side is scaled down to this length (only if larger).
    pub limit_side_len: u32,
}

impl DetResize {
    /// Creates a new DetResize with the given side-length cap.
    pub fn new(limit_side_len: u32) -> Self {
        Self { limit_side_len }
    }

    /// Computes the legalized model input dimensions for an image.
    ///
    /// The image is scaled so the longer side is at most the cap, preserving
    /// aspect ratio, then each dimension is rounded down to the nearest
    /// multiple of 32 and clamped to at least 32.
    ///
    /// # Arguments
    ///
    /// * `width` - Original image width.
    /// * `height` - Original image height.
    ///
    /// # Returns
    ///
    /// The `(width, height)` the detection input tensor will have.
    pub fn target_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let longer = width.max(height);
        let scale = if longer > self.limit_side_len {
            self.limit_side_len as f32 / longer as f32
        } else {
            1.0
        };

        let legalize = |side: u32| -> u32 {
            let scaled = (side as f32 * scale) as u32;
            (scaled / 32 * 32).max(32)
        };

        (legalize(width), legalize(height))
    }

    /// Resizes an image to its legalized detection input dimensions.
    ///
    /// # Arguments
    ///
    /// * `img` - The image to resize.
    ///
    /// # Returns
    ///
    /// The resized image and the scale information for mapping detections
    /// back to original coordinates.
    pub fn apply(&self, img: &RgbaImage) -> (RgbaImage, DetScale) {
        let (src_w, src_h) = img.dimensions();
        let (resized_w, resized_h) = self.target_dims(src_w, src_h);

        let resized = if (resized_w, resized_h) == (src_w, src_h) {
            img.clone()
        } else {
            imageops::resize(img, resized_w, resized_h, FilterType::Triangle)
        };

        (
            resized,
            DetScale {
                src_w,
                src_h,
                resized_w,
                resized_h,
            },
        )
    }
}

/// Resizer for recognition and classification crops.
#[derive(Debug)]
pub struct RecResize {
    /// Target strip height.
    pub height: u32,
}

impl RecResize {
    /// Creates a new RecResize with the given strip height.
    pub fn new(height: u32) -> Self {
        Self { height }
    }

    /// Resizes a crop to the strip height, following its aspect ratio.
    ///
    /// The resized width is `ceil(height * aspect)`, clamped to
    /// `[1, max_width]`; the caller pads the remainder of its tensor plane
    /// with zeros.
    ///
    /// # Arguments
    ///
    /// * `img` - The crop to resize.
    /// * `max_width` - Upper bound for the resized width.
    ///
    /// # Returns
    ///
    /// The resized crop; its width is the crop's content width within the
    /// padded plane.
    pub fn apply(&self, img: &RgbaImage, max_width: u32) -> RgbaImage {
        let (w, h) = img.dimensions();
        let ratio = if h == 0 { 0.0 } else { w as f32 / h as f32 };
        let content_w = ((self.height as f32 * ratio).ceil() as u32).clamp(1, max_width.max(1));

        imageops::resize(img, content_w, self.height, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_det_resize_caps_longer_side() {
        let resize = DetResize::new(960);
        let (w, h) = resize.target_dims(1920, 1080);
        // Scale factor 0.5 -> 960x540 -> floor to multiples of 32.
        assert_eq!(w, 960);
        assert_eq!(h, 512);
    }

    #[test]
    fn test_det_resize_keeps_small_images() {
        let resize = DetResize::new(960);
        let (w, h) = resize.target_dims(640, 480);
        assert_eq!(w, 640);
        assert_eq!(h, 448);
    }

    #[test]
    fn test_det_resize_clamps_to_minimum() {
        let resize = DetResize::new(960);
        let (w, h) = resize.target_dims(20, 3000);
        assert_eq!(w, 32);
        assert!(h >= 32);
        assert_eq!(h % 32, 0);
    }

    #[test]
    fn test_det_resize_apply_dimensions() {
        let resize = DetResize::new(960);
        let img = RgbaImage::new(100, 50);
        let (resized, scale) = resize.apply(&img);
        assert_eq!(resized.dimensions(), (96, 32));
        assert_eq!(scale.src_w, 100);
        assert!((scale.ratio_w() - 100.0 / 96.0).abs() < 1e-6);
    }

    #[test]
    fn test_rec_resize_follows_aspect() {
        let resize = RecResize::new(48);
        let img = RgbaImage::new(100, 50);
        let resized = resize.apply(&img, 10_000);
        assert_eq!(resized.dimensions(), (96, 48));
    }

    #[test]
    fn test_rec_resize_clamps_to_max_width() {
        let resize = RecResize::new(48);
        let img = RgbaImage::new(1000, 50);
        let resized = resize.apply(&img, 192);
        assert_eq!(resized.dimensions(), (192, 48));
    }
}
