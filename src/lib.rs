//! Feed-forward classifier with two sigmoid hidden layers and a softmax output, trained by
//! full-batch backpropagation with momentum on the sum-of-squares loss.

pub mod act_fn;
pub mod backprop;
pub mod bias;
pub mod cli;
pub mod error;
pub mod eval;
pub mod layer;
pub mod net;
pub mod optimizer;
pub mod utils;

pub use backprop::{ForwardPass, Gradients};
pub use bias::augment_with_bias;
pub use error::{Error, Result};
pub use eval::Evaluation;
pub use net::{Network, Sizes};
