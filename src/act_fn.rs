use std::fmt::Display;

use nalgebra::DMatrix;

/// Logistic (unipolar sigmoid) activation used by both hidden layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sigmoid {
    /// steepness of the curve
    pub beta: f64,
}

impl Sigmoid {
    /// Computes f(x) = 1 / (1 + exp(-beta * x))
    pub fn compute(&self, val: f64) -> f64 {
        return 1.0 / (1.0 + (-self.beta * val).exp());
    }

    /// Computes f'(x) from the already activated value a = f(x), which is beta * a * (1 - a).
    /// Applied to the bias column (a = -1) this yields a meaningless value, callers drop it.
    pub fn compute_prime(&self, activated: f64) -> f64 {
        return activated * self.beta * (1.0 - activated);
    }

    /// Element-wise activation of the whole matrix
    pub fn apply(&self, raw: &DMatrix<f64>) -> DMatrix<f64> {
        return raw.map(|val| return self.compute(val));
    }

    /// Element-wise derivative of the whole matrix of activated values
    pub fn apply_prime(&self, activated: &DMatrix<f64>) -> DMatrix<f64> {
        return activated.map(|val| return self.compute_prime(val));
    }
}

impl Display for Sigmoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Sigmoid(beta = {})", self.beta);
    }
}

/// Row-wise softmax, each row is turned into a probability distribution.
/// There's no max-subtraction, large raw scores overflow to inf/NaN and it's up to the caller to
/// detect that.
pub fn softmax_rows(raw: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = raw.map(f64::exp);
    for mut row in out.row_iter_mut() {
        let total: f64 = row.sum();
        row /= total;
    }
    return out;
}
