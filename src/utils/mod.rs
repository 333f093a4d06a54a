//! Utility functions for image loading, dictionary handling, and
//! perspective transformation.

pub mod dict;
pub mod image;
pub mod transform;

pub use dict::load_dictionary;
pub use image::load_rgba_image;
pub use transform::{get_perspective_transform, rotate_90_ccw, rotate_180, warp_perspective};
