//! Inference backend implementations.

#[cfg(feature = "native")]
pub mod ort;

use crate::{Result, Tensor};

/// Trait for ONNX inference backends.
///
/// Backends must be shareable across threads: one detector instance is
/// reused by every document worker.
pub trait InferenceBackend: Send + Sync {
    /// Run inference with the given named inputs and return named outputs.
    fn run(&self, inputs: &[(&str, Tensor)]) -> Result<Vec<(String, Tensor)>>;

    /// Input names expected by the model.
    fn input_names(&self) -> &[String];

    /// Output names produced by the model.
    fn output_names(&self) -> &[String];
}
