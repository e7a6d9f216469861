//! Batch deblurring pipeline.

mod batch;
mod inputs;

pub use batch::{BatchProcessor, BatchReport, Config, ErrorPolicy};
pub use inputs::{enumerate_inputs, SUPPORTED_EXTENSIONS};
