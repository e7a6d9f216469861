//! Image loading utilities.

use std::path::Path;

use image::RgbImage;

use crate::error::{Error, Result};

/// Load an image from disk as 8-bit RGB.
///
/// Alpha is dropped and grayscale is expanded to three channels.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(img.to_rgb8())
}
