use std::fmt::Display;

use nalgebra::DMatrix;

use crate::error::{Error, Result};

/// Result of evaluating the network on held-out data
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// confusion[(i, j)] counts samples predicted as class i whose true class is j
    pub confusion: DMatrix<usize>,
    /// percentage of correctly classified samples (0.0 to 100.0)
    pub accuracy: f64,
}

impl Evaluation {
    /// Build the confusion matrix from predicted and true class indices
    pub fn from_predictions(predicted: &[usize], expected: &[usize], num_classes: usize) -> Result<Self> {
        if predicted.len() != expected.len() {
            return Err(Error::ShapeMismatch {
                what: "class predictions",
                expected: (expected.len(), 1),
                found: (predicted.len(), 1),
            });
        }
        let mut confusion = DMatrix::<usize>::zeros(num_classes, num_classes);
        for (&pred, &truth) in predicted.iter().zip(expected) {
            confusion[(pred, truth)] += 1;
        }
        let total: usize = confusion.iter().sum();
        if total == 0 {
            return Err(Error::NumericInstability(String::from("accuracy is undefined for an empty evaluation set")));
        }
        let correct: usize = (0..num_classes).map(|i| return confusion[(i, i)]).sum();
        return Ok(Evaluation {
            confusion,
            accuracy: correct as f64 / total as f64 * 100.0,
        });
    }

    /// Number of evaluated samples
    pub fn total(&self) -> usize {
        return self.confusion.iter().sum();
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "The confusion matrix is:{}", self.confusion)?;
        return write!(f, "The accuracy is {:.2}%", self.accuracy);
    }
}
