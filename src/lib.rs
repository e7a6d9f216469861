//! # nafdeblur
//!
//! Batch-deblur images with a NAFNet model and save `original | deblurred`
//! comparisons.
//!
//! The model only accepts square canvases whose side is a multiple of 256
//! (up to 4864). Each image is padded onto such a black canvas, run through
//! the model, and both the input and the result are cropped back to the
//! original extent before being placed side by side.
//!
//! ## Example
//!
//! ```no_run
//! use nafdeblur::model::{OnnxDeblur, ValueRange};
//! use nafdeblur::{BatchProcessor, Config};
//!
//! # fn main() -> nafdeblur::Result<()> {
//! let model = OnnxDeblur::load("weights/nafnet.onnx", ValueRange::Unit)?;
//! let mut processor = BatchProcessor::headless(Config::default(), model)?;
//!
//! let report = processor.run("blurry/")?;
//! println!("{} written", report.processed.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod preview;

pub use error::{Error, Result};
pub use model::Deblur;
pub use pipeline::{BatchProcessor, BatchReport, Config, ErrorPolicy};
pub use preview::{NoPreview, Preview};
