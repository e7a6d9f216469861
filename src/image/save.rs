//! Output assembly and saving utilities.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{codecs::jpeg::JpegEncoder, imageops, ImageError, ImageFormat, Rgb, RgbImage};

use crate::error::{Error, Result};

use super::{OutputArray, RGB_CHANNELS};

/// Convert a square HWC model output of side `side` to an RGB image.
///
/// Values are clamped to `[0, 255]` and rounded.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the array is not `(side, side, 3)`.
#[allow(clippy::cast_possible_truncation)]
pub fn output_to_image(output: &OutputArray, side: u32) -> Result<RgbImage> {
    let n = side as usize;
    if output.shape() != [n, n, RGB_CHANNELS] {
        return Err(Error::ShapeMismatch {
            expected: format!("[{n}, {n}, {RGB_CHANNELS}]"),
            actual: format!("{:?}", output.shape()),
        });
    }

    Ok(RgbImage::from_fn(side, side, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            to_u8(output[[y, x, 0]]),
            to_u8(output[[y, x, 1]]),
            to_u8(output[[y, x, 2]]),
        ])
    }))
}

/// Clamp to the 8-bit range and round.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f32) -> u8 {
    // Safe: clamped to [0, 255] before casting, NaN casts to 0
    value.clamp(0.0, 255.0).round() as u8
}

/// Place `left` and `right` next to each other.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the heights differ.
pub fn side_by_side(left: &RgbImage, right: &RgbImage) -> Result<RgbImage> {
    if left.height() != right.height() {
        return Err(Error::ShapeMismatch {
            expected: format!("height {}", left.height()),
            actual: format!("height {}", right.height()),
        });
    }

    let mut combined = RgbImage::new(left.width() + right.width(), left.height());
    imageops::replace(&mut combined, left, 0, 0);
    imageops::replace(&mut combined, right, i64::from(left.width()), 0);
    Ok(combined)
}

/// Save an RGB image, choosing the encoder from the file extension.
///
/// The image is encoded into a `.partial` sibling first and renamed into
/// place, so a failed save never leaves a file at `path`.
///
/// # Arguments
///
/// * `img` - Image to save
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the format is unknown or the image cannot be written.
pub fn save_image<P: AsRef<Path>>(img: &RgbImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();
    let save_err = |source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    };

    let format = ImageFormat::from_path(path).map_err(save_err)?;
    let partial = partial_path(path);

    let written = match format {
        ImageFormat::Jpeg => {
            let mut output = BufWriter::new(File::create(&partial)?);
            let encoder = JpegEncoder::new_with_quality(&mut output, quality);
            img.write_with_encoder(encoder)
                .and_then(|()| output.flush().map_err(ImageError::IoError))
        }
        _ => img.save_with_format(&partial, format),
    };

    if let Err(source) = written {
        // Best effort: the partial file is garbage either way
        let _ = fs::remove_file(&partial);
        return Err(save_err(source));
    }

    fs::rename(&partial, path)?;
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
