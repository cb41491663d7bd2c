use nalgebra::DMatrix;
use rand::Rng;

use crate::error::{ensure_shape, Result};

/// Fully connected layer with the bias folded into the last row of the weight matrix
#[derive(Debug, Clone)]
pub struct Layer {
    pub layer_index: usize,
    pub neuron_count: usize,
    /// width of the layer's input without the bias column
    pub fan_in: usize,
    /// shape (fan_in + 1, neuron_count)
    pub weights: DMatrix<f64>,
}

impl Layer {
    /// Create a layer with weights drawn uniformly from [-1/sqrt(fan_in), 1/sqrt(fan_in)]
    pub fn random<R: Rng>(layer_index: usize, fan_in: usize, neuron_count: usize, rng: &mut R) -> Self {
        let limit = 1.0 / (fan_in as f64).sqrt();
        let weights = DMatrix::from_fn(fan_in + 1, neuron_count, |_, _| return rng.gen_range(-limit..=limit));
        return Layer {
            layer_index,
            neuron_count,
            fan_in,
            weights,
        };
    }

    /// Compute the raw (not activated) output from the bias-augmented input, shape (N, neuron_count)
    pub fn compute(&self, input: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        ensure_shape("layer input", (input.nrows(), self.fan_in + 1), input.shape())?;
        return Ok(input * &self.weights);
    }
}
