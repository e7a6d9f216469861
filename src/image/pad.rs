//! Tile-aligned square padding and the inverse crop.
//!
//! The model only accepts square canvases whose side is a multiple of
//! [`TILE_SIZE`]. An input image is pasted onto a black canvas of the smallest
//! such side that bounds it, and the [`Region`] records where it landed so the
//! model output can be cropped back to the original extent.

use image::{imageops, RgbImage};

use crate::error::{Error, Result};

use super::{MAX_CANVAS, TILE_SIZE};

/// Side of the square canvas that bounds a `width` x `height` image.
#[must_use]
pub const fn padded_size(width: u32, height: u32) -> u32 {
    let longest = if width > height { width } else { height };
    longest.div_ceil(TILE_SIZE) * TILE_SIZE
}

/// Whether the model accepts a canvas with this side length.
#[must_use]
pub const fn is_supported_size(side: u32) -> bool {
    side % TILE_SIZE == 0 && side >= TILE_SIZE && side <= MAX_CANVAS
}

/// Border widths added around an image.
///
/// When the total padding along an axis is odd, the extra pixel goes to the
/// top/left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    /// Margins that center a `width` x `height` image on a `target` square.
    ///
    /// `target` must be at least as large as both dimensions.
    #[must_use]
    pub const fn for_image(width: u32, height: u32, target: u32) -> Self {
        let add_w = target - width;
        let add_h = target - height;
        Self {
            top: add_h.div_ceil(2),
            right: add_w / 2,
            bottom: add_h / 2,
            left: add_w.div_ceil(2),
        }
    }
}

/// Half-open box `[top, bottom) x [left, right)` in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Region {
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Copy this region out of `image`.
    #[must_use]
    pub fn crop(&self, image: &RgbImage) -> RgbImage {
        imageops::crop_imm(image, self.left, self.top, self.width(), self.height()).to_image()
    }
}

/// A tile-aligned canvas together with the location of the original content.
#[derive(Debug, Clone)]
pub struct Padded {
    pub canvas: RgbImage,
    pub region: Region,
}

impl Padded {
    /// Side length of the square canvas.
    #[must_use]
    pub fn side(&self) -> u32 {
        self.canvas.width()
    }
}

/// Pad `image` onto the smallest supported black square canvas.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSize`] if the canvas would be larger than
/// [`MAX_CANVAS`] or the image is empty.
pub fn pad_to_tile(image: &RgbImage) -> Result<Padded> {
    let (width, height) = image.dimensions();
    let target = padded_size(width, height);

    if !is_supported_size(target) {
        return Err(Error::UnsupportedSize {
            width,
            height,
            target,
        });
    }

    let margins = Margins::for_image(width, height, target);
    tracing::debug!("Padding {width}x{height} to {target}x{target} with {margins:?}");

    let mut canvas = RgbImage::new(target, target);
    imageops::replace(
        &mut canvas,
        image,
        i64::from(margins.left),
        i64::from(margins.top),
    );

    let region = Region {
        top: margins.top,
        left: margins.left,
        bottom: margins.top + height,
        right: margins.left + width,
    };

    Ok(Padded { canvas, region })
}
