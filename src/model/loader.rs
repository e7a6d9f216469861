//! ONNX model loading and inference.

use std::path::{Path, PathBuf};

use image::RgbImage;
use ndarray::{Array4, Axis};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::{OutputArray, RGB_CHANNELS};

use super::Deblur;

/// Pixel value range the model was exported with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueRange {
    /// Inputs and outputs in `[0, 1]`.
    #[default]
    Unit,
    /// Inputs and outputs in `[0, 255]`.
    Byte,
}

impl ValueRange {
    /// Factor that turns a model value into 8-bit pixel units.
    #[must_use]
    pub const fn scale(self) -> f32 {
        match self {
            Self::Unit => 255.0,
            Self::Byte => 1.0,
        }
    }
}

/// NAFNet (or any same-shape image-to-image) model run through ONNX Runtime.
///
/// The model takes a single NCHW `f32` tensor `(1, 3, n, n)` and its first
/// output must have the same shape.
pub struct OnnxDeblur {
    session: Session,
    path: PathBuf,
    range: ValueRange,
}

impl OnnxDeblur {
    /// Load a model from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or is not a loadable model.
    pub fn load<P: AsRef<Path>>(path: P, range: ValueRange) -> Result<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(Error::ModelMissing(path.to_path_buf()));
        }

        tracing::info!("Loading model from {}", path.display());

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            session,
            path: path.to_path_buf(),
            range,
        })
    }

    /// Path the model was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deblur for OnnxDeblur {
    fn deblur(&mut self, input: &RgbImage) -> Result<OutputArray> {
        let tensor = image_to_tensor(input, self.range);
        let expected = tensor.shape().to_vec();

        let input_value = Tensor::from_array(tensor).map_err(|source| Error::Inference { source })?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "deblurred image output".to_string(),
                actual: "no output".to_string(),
            })?;

        let nchw = extract_array4(&output)?;
        if nchw.shape() != expected.as_slice() {
            return Err(Error::ShapeMismatch {
                expected: format!("{expected:?}"),
                actual: format!("{:?}", nchw.shape()),
            });
        }

        Ok(tensor_to_output(&nchw, self.range))
    }
}

/// Convert an RGB image to an NCHW tensor in the model's value range.
#[allow(clippy::cast_possible_truncation)]
fn image_to_tensor(img: &RgbImage, range: ValueRange) -> Array4<f32> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let scale = range.scale();

    let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, height, width));

    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..RGB_CHANNELS {
            tensor[[0, c, y, x]] = f32::from(pixel[c]) / scale;
        }
    }

    tensor
}

/// Convert an NCHW model output back to HWC pixel units.
fn tensor_to_output(tensor: &Array4<f32>, range: ValueRange) -> OutputArray {
    let scale = range.scale();
    tensor
        .index_axis(Axis(0), 0)
        .permuted_axes([1, 2, 0])
        .mapv(|v| v * scale)
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_tensor_layout_and_scale() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(3, 1, Rgb([255, 51, 0]));

        let tensor = image_to_tensor(&img, ValueRange::Unit);

        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert!((tensor[[0, 0, 1, 3]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 1, 3]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 2, 1, 3]], 0.0);
    }

    #[test]
    fn test_byte_range_is_unscaled() {
        let img = RgbImage::from_pixel(2, 2, Rgb([7, 8, 9]));
        let tensor = image_to_tensor(&img, ValueRange::Byte);
        assert_eq!(tensor[[0, 2, 0, 0]], 9.0);
    }

    #[test]
    fn test_output_back_to_hwc() {
        let img = RgbImage::from_fn(3, 3, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 200]));
        let tensor = image_to_tensor(&img, ValueRange::Unit);

        let output = tensor_to_output(&tensor, ValueRange::Unit);

        assert_eq!(output.shape(), &[3, 3, 3]);
        assert!((output[[1, 2, 0]] - 20.0).abs() < 1e-3);
        assert!((output[[1, 2, 1]] - 10.0).abs() < 1e-3);
        assert!((output[[1, 2, 2]] - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.onnx");

        let err = OnnxDeblur::load(&path, ValueRange::Unit).err().unwrap();

        assert!(matches!(err, Error::ModelMissing(p) if p == path));
    }
}
