//! ONNX inference layer for dealerscan.
//!
//! The visual detectors (dealer stamp, dealer signature) are YOLO models
//! exported to ONNX. This crate hides the runtime behind [`InferenceBackend`]
//! so the detector code in `dealerscan-core` can be tested with a fake
//! backend and run natively through `ort` with XNNPACK.

mod backend;
mod error;
mod tensor;

pub use backend::InferenceBackend;
pub use error::InferenceError;
pub use tensor::Tensor;

#[cfg(feature = "native")]
pub use backend::ort::OrtBackend;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
