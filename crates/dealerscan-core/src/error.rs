//! Error types for the dealerscan-core library.
//!
//! "No answer" is not an error: resolvers report abstention through
//! [`Reason`](crate::models::result::Reason). These types cover contract
//! violations and collaborator failures only.

use thiserror::Error;

/// Main error type for the dealerscan library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Malformed OCR input; fails the whole document.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Visual detector failure.
    #[error("detection error: {0}")]
    Detection(#[from] DetectionError),

    /// Inference error from the inference layer.
    #[error("inference error: {0}")]
    Inference(#[from] dealerscan_inference::InferenceError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Contract violations at the OCR ingestion boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A token bounding box did not have exactly four corner points.
    #[error("token {index} has a malformed bounding box: expected 4 points, got {points}")]
    MalformedQuad { index: usize, points: usize },

    /// A coordinate was NaN or infinite.
    #[error("token {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    /// Page dimensions must be positive and finite.
    #[error("invalid page size {width}x{height}")]
    InvalidPageSize { width: f32, height: f32 },
}

/// Errors raised by visual detectors.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// The model produced an output we cannot interpret.
    #[error("unexpected detector output: {0}")]
    UnexpectedOutput(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Ground-truth file could not be parsed.
    #[error("invalid ground truth: {0}")]
    GroundTruth(String),
}

/// Result type for the dealerscan library.
pub type Result<T> = std::result::Result<T, ScanError>;
