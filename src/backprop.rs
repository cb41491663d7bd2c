//! Backward pass: error signals (deltas) of every layer and the weight gradients derived from them.
//!
//! The loss is the sum of squares `0.5 * sum((outputs - targets)^2)` taken through the softmax, so
//! the output delta goes through the full softmax Jacobian instead of the `outputs - targets`
//! shortcut that only holds for cross-entropy.

use nalgebra::{DMatrix, RowDVector};
use rayon::prelude::*;

use crate::{act_fn::Sigmoid, bias::strip_bias};

/// Activations produced by one forward pass, consumed by the backward pass of the same iteration
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// first hidden layer activations with the bias column, shape (N, nhidden1 + 1)
    pub hidden1: DMatrix<f64>,
    /// second hidden layer activations with the bias column, shape (N, nhidden2 + 1)
    pub hidden2: DMatrix<f64>,
    /// softmax probabilities, shape (N, nout)
    pub outputs: DMatrix<f64>,
}

/// Gradients of the loss with respect to each weight matrix, shapes match the weights
#[derive(Debug, Clone)]
pub struct Gradients {
    pub layer1: DMatrix<f64>,
    pub layer2: DMatrix<f64>,
    pub output: DMatrix<f64>,
}

impl Gradients {
    /// Gradients in layer order
    pub fn as_array(&self) -> [&DMatrix<f64>; 3] {
        return [&self.layer1, &self.layer2, &self.output];
    }
}

/// Jacobian of the softmax for a single row of probabilities:
/// J[j][k] = p_j * (1 - p_j) if j == k, otherwise -p_j * p_k
pub fn softmax_jacobian(probs: &[f64]) -> DMatrix<f64> {
    let n = probs.len();
    return DMatrix::from_fn(n, n, |j, k| {
        if j == k {
            return probs[j] * (1.0 - probs[j]);
        } else {
            return -probs[j] * probs[k];
        }
    });
}

/// Output layer delta, row i is (outputs[i] - targets[i]) * J(outputs[i]).
/// Rows are independent, so they are computed in parallel and reassembled in order.
pub fn output_deltas(outputs: &DMatrix<f64>, targets: &DMatrix<f64>) -> DMatrix<f64> {
    let (ndata, nout) = outputs.shape();
    let rows: Vec<Vec<f64>> = (0..ndata)
        .into_par_iter()
        .map(|i| {
            let probs: Vec<f64> = outputs.row(i).iter().copied().collect();
            let error = RowDVector::from_iterator(nout, probs.iter().zip(targets.row(i).iter()).map(|(o, t)| return o - t));
            let jacobian = softmax_jacobian(&probs);
            let delta = &error * &jacobian;
            let delta_row: Vec<f64> = delta.iter().copied().collect();
            return delta_row;
        })
        .collect();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    return DMatrix::from_row_slice(ndata, nout, &flat);
}

/// Delta of a sigmoid hidden layer: a ⊙ beta ⊙ (1 - a) ⊙ (downstream_delta · W^T).
/// The result keeps the bias column, which callers strip before propagating further.
pub fn hidden_deltas(activated: &DMatrix<f64>, downstream_delta: &DMatrix<f64>, downstream_weights: &DMatrix<f64>, act: Sigmoid) -> DMatrix<f64> {
    let propagated = downstream_delta * downstream_weights.transpose();
    return act.apply_prime(activated).component_mul(&propagated);
}

/// Run the whole backward pass. Shapes are expected to be validated by the caller.
pub fn compute_gradients(
    inputs: &DMatrix<f64>,
    pass: &ForwardPass,
    targets: &DMatrix<f64>,
    weights2: &DMatrix<f64>,
    weights3: &DMatrix<f64>,
    act: Sigmoid,
) -> Gradients {
    let deltao = output_deltas(&pass.outputs, targets);
    let deltah2 = hidden_deltas(&pass.hidden2, &deltao, weights3, act);
    // the bias unit has no incoming weights, its delta doesn't propagate
    let deltah2 = strip_bias(&deltah2);
    let deltah1 = strip_bias(&hidden_deltas(&pass.hidden1, &deltah2, weights2, act));

    return Gradients {
        layer1: inputs.transpose() * deltah1,
        layer2: pass.hidden1.transpose() * deltah2,
        output: pass.hidden2.transpose() * deltao,
    };
}
