//! Dense f32 tensors exchanged with the backend.

use ndarray::{ArrayD, IxDyn};

use crate::{InferenceError, Result};

/// A dense f32 tensor. Detector models only consume and produce f32.
#[derive(Debug, Clone)]
pub struct Tensor(pub ArrayD<f32>);

impl Tensor {
    /// Build a tensor from raw data and a shape.
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map(Tensor)
            .map_err(|e| InferenceError::InvalidInput(e.to_string()))
    }

    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// Borrow the underlying array.
    pub fn view(&self) -> &ArrayD<f32> {
        &self.0
    }
}

impl From<ArrayD<f32>> for Tensor {
    fn from(arr: ArrayD<f32>) -> Self {
        Tensor(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_shape_vec() {
        let t = Tensor::from_shape_vec(vec![1, 2, 3], vec![0.0; 6]).unwrap();
        assert_eq!(t.shape(), &[1, 2, 3]);
    }

    #[test]
    fn test_from_shape_vec_mismatch() {
        let err = Tensor::from_shape_vec(vec![2, 2], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }
}
