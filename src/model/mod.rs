//! Deblurring model interface and the ONNX Runtime backend.

mod loader;

pub use loader::{OnnxDeblur, ValueRange};

use image::RgbImage;

use crate::error::Result;
use crate::image::OutputArray;

/// A model that deblurs a square, tile-aligned RGB canvas.
///
/// Implementations must return an HWC array with the same height and width as
/// the input and three channels, in 0..=255 pixel units. Values outside that
/// range are clamped by the caller.
pub trait Deblur {
    /// Run the model on one padded canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails to run.
    fn deblur(&mut self, input: &RgbImage) -> Result<OutputArray>;
}

impl<F> Deblur for F
where
    F: FnMut(&RgbImage) -> Result<OutputArray>,
{
    fn deblur(&mut self, input: &RgbImage) -> Result<OutputArray> {
        self(input)
    }
}
