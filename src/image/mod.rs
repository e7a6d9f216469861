//! Image loading, tile padding, and saving utilities.

mod load;
mod pad;
mod save;

pub use load::load_rgb;
pub use pad::{is_supported_size, pad_to_tile, padded_size, Margins, Padded, Region};
pub use save::{output_to_image, save_image, side_by_side};

use ndarray::Array3;

/// Model output in HWC layout (height, width, channel), in 0..=255 pixel units.
pub type OutputArray = Array3<f32>;

/// Model input sides must be a multiple of this.
pub const TILE_SIZE: u32 = 256;

/// Largest supported canvas, in tiles per side.
pub const MAX_TILES: u32 = 19;

/// Largest supported canvas side in pixels.
pub const MAX_CANVAS: u32 = TILE_SIZE * MAX_TILES;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
