use nalgebra::DMatrix;

use crate::backprop::Gradients;

/// Momentum accumulators for a single training run.
/// Each step is `update = eta * grad + momentum * previous_update`, the caller subtracts it from the
/// weights. Accumulators start at zero and only live as long as the run that owns them.
#[derive(Debug, Clone)]
pub struct Momentum {
    momentum: f64,
    last_updates: [DMatrix<f64>; 3],
}

impl Momentum {
    /// Create zeroed accumulators matching the shapes of the given weight matrices
    pub fn new(momentum: f64, weights: [&DMatrix<f64>; 3]) -> Self {
        let last_updates = weights.map(|w| return DMatrix::zeros(w.nrows(), w.ncols()));
        return Momentum { momentum, last_updates };
    }

    /// Compute the updates for this iteration from the gradients, remember them for the next one
    /// and return them in layer order
    pub fn step(&mut self, eta: f64, grads: &Gradients) -> &[DMatrix<f64>; 3] {
        for (last, grad) in self.last_updates.iter_mut().zip(grads.as_array()) {
            *last = eta * grad + self.momentum * &*last;
        }
        return &self.last_updates;
    }

    pub fn last_updates(&self) -> &[DMatrix<f64>; 3] {
        return &self.last_updates;
    }
}
