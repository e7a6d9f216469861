//! Custom error types for nafdeblur.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the nafdeblur library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or decode an input image.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to encode or write an output image.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The padded canvas would fall outside the sizes the model accepts.
    #[error(
        "unsupported image size {width}x{height}: padded canvas {target}x{target} \
         is not a multiple of 256 between 256 and 4864"
    )]
    UnsupportedSize { width: u32, height: u32, target: u32 },

    /// Failed to load the ONNX model.
    #[error("failed to load ONNX model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// The model file does not exist.
    #[error("model file does not exist: {0}")]
    ModelMissing(PathBuf),

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Shape mismatch between what the model was given and what it returned.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The preview window could not be shown.
    #[error("failed to show preview: {0}")]
    Preview(String),

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A single image in a batch failed.
    #[error("failed to process {path}: {source}")]
    Item {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap this error with the input file it belongs to.
    #[must_use]
    pub fn for_item(self, path: impl Into<PathBuf>) -> Self {
        Self::Item {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through `Item` wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Item { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for nafdeblur operations.
pub type Result<T> = std::result::Result<T, Error>;
