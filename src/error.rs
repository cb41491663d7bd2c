//! Error types shared by the numeric engine and the command-line driver.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Matrix handed to a public operation doesn't have the shape the network expects
    #[error("shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Overflow in the softmax, non-finite loss or an empty evaluation set
    #[error("numeric instability: {0}")]
    NumericInstability(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed data file or unknown class label
    #[error("invalid data: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fail with [`Error::ShapeMismatch`] unless `found` equals `expected`.
pub fn ensure_shape(what: &'static str, expected: (usize, usize), found: (usize, usize)) -> Result<()> {
    if expected != found {
        return Err(Error::ShapeMismatch { what, expected, found });
    }
    return Ok(());
}
