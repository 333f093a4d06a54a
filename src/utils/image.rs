//! Image loading utilities.

use crate::core::OCRError;
use image::RgbaImage;
use std::path::Path;

/// Loads an image from disk as RGBA pixels.
///
/// A missing path is an argument error the caller may retry with a different
/// input; an unreadable or undecodable file surfaces the decoder error.
///
/// # Arguments
///
/// * `path` - The path to the image file.
///
/// # Returns
///
/// A Result containing the decoded image or an OCRError.
pub fn load_rgba_image(path: impl AsRef<Path>) -> Result<RgbaImage, OCRError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(OCRError::invalid_input(format!(
            "image path does not exist: {}",
            path.display()
        )));
    }

    let image = image::open(path)?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_is_invalid_input() {
        let result = load_rgba_image("/definitely/not/here.png");
        assert!(matches!(result, Err(OCRError::InvalidInput { .. })));
    }
}
