//! Bias augmentation: the bias of every layer is stored as the last row of its weight matrix and
//! is multiplied by a constant input of -1 appended to the layer's input.

use nalgebra::DMatrix;

/// Constant value of the bias input
pub const BIAS_INPUT: f64 = -1.0;

/// Append a column of [`BIAS_INPUT`] to the matrix, shape (N, k) -> (N, k + 1)
pub fn augment_with_bias(m: &DMatrix<f64>) -> DMatrix<f64> {
    return m.clone().insert_column(m.ncols(), BIAS_INPUT);
}

/// Drop the trailing (bias) column of the matrix, shape (N, k + 1) -> (N, k)
pub fn strip_bias(m: &DMatrix<f64>) -> DMatrix<f64> {
    let kept = m.ncols().saturating_sub(1);
    return m.columns(0, kept).clone_owned();
}

/// Index of the largest value of each row, the first one wins on ties
pub fn argmax_rows(m: &DMatrix<f64>) -> Vec<usize> {
    return m
        .row_iter()
        .map(|row| {
            let mut best_idx = 0;
            for (idx, val) in row.iter().enumerate() {
                if *val > row[best_idx] {
                    best_idx = idx;
                }
            }
            return best_idx;
        })
        .collect();
}
