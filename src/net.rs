use log::{info, trace};
use nalgebra::DMatrix;
use rand::Rng;

use crate::{
    act_fn::{softmax_rows, Sigmoid},
    backprop::{compute_gradients, ForwardPass, Gradients},
    bias::{argmax_rows, augment_with_bias},
    error::{ensure_shape, Error, Result},
    eval::Evaluation,
    layer::Layer,
    optimizer::Momentum,
    utils::compute_cost,
};

/// Iterations between two logged losses
pub const LOG_EVERY: usize = 100;

/// Widths of the network: input features, both hidden layers and output classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizes {
    pub nin: usize,
    pub nhidden1: usize,
    pub nhidden2: usize,
    pub nout: usize,
}

/// Feed-forward classifier with two sigmoid hidden layers and a softmax output layer
#[derive(Debug, Clone)]
pub struct Network {
    sizes: Sizes,
    hidden1: Layer,
    hidden2: Layer,
    output: Layer,
    act: Sigmoid,
    momentum: f64,
}

impl Network {
    pub const DEFAULT_BETA: f64 = 1.0;
    pub const DEFAULT_MOMENTUM: f64 = 0.9;

    /// Creates a new network with randomly initialised weights
    pub fn new(sizes: Sizes, beta: f64, momentum: f64) -> Result<Self> {
        return Self::with_rng(sizes, beta, momentum, &mut rand::thread_rng());
    }

    /// Creates a new network drawing the initial weights from the given random generator
    pub fn with_rng<R: Rng>(sizes: Sizes, beta: f64, momentum: f64, rng: &mut R) -> Result<Self> {
        if [sizes.nin, sizes.nhidden1, sizes.nhidden2, sizes.nout].contains(&0) {
            return Err(Error::InvalidConfig(format!("all layer sizes must be positive, got {:?}", sizes)));
        }
        trace!("creating new network {:?} with beta {} and momentum {}", sizes, beta, momentum);
        let hidden1 = Layer::random(0, sizes.nin, sizes.nhidden1, rng);
        let hidden2 = Layer::random(1, sizes.nhidden1, sizes.nhidden2, rng);
        let output = Layer::random(2, sizes.nhidden2, sizes.nout, rng);
        return Ok(Network {
            sizes,
            hidden1,
            hidden2,
            output,
            act: Sigmoid { beta },
            momentum,
        });
    }

    pub fn sizes(&self) -> Sizes {
        return self.sizes;
    }

    pub fn beta(&self) -> f64 {
        return self.act.beta;
    }

    pub fn momentum(&self) -> f64 {
        return self.momentum;
    }

    /// Weight matrices in layer order, each with the bias as its last row
    pub fn weights(&self) -> [&DMatrix<f64>; 3] {
        return [&self.hidden1.weights, &self.hidden2.weights, &self.output.weights];
    }

    /// Pass the bias-augmented inputs (N, nin + 1) through the network and keep every activation
    pub fn forward(&self, inputs: &DMatrix<f64>) -> Result<ForwardPass> {
        ensure_shape("inputs", (inputs.nrows(), self.sizes.nin + 1), inputs.shape())?;
        // hidden layers: weighted sum -> sigmoid -> bias column for the next layer
        let hidden1 = augment_with_bias(&self.act.apply(&self.hidden1.compute(inputs)?));
        let hidden2 = augment_with_bias(&self.act.apply(&self.hidden2.compute(&hidden1)?));
        let outputs = softmax_rows(&self.output.compute(&hidden2)?);
        if outputs.iter().any(|v| return !v.is_finite()) {
            return Err(Error::NumericInstability(String::from("softmax produced a non-finite probability")));
        }
        return Ok(ForwardPass { hidden1, hidden2, outputs });
    }

    /// Class probabilities (N, nout) for the bias-augmented inputs (N, nin + 1)
    pub fn forward_pass(&self, inputs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        return Ok(self.forward(inputs)?.outputs);
    }

    /// Gradients of the sum-of-squares loss for the given forward pass
    pub fn backward(&self, inputs: &DMatrix<f64>, pass: &ForwardPass, targets: &DMatrix<f64>) -> Result<Gradients> {
        let ndata = inputs.nrows();
        ensure_shape("inputs", (ndata, self.sizes.nin + 1), inputs.shape())?;
        ensure_shape("targets", (ndata, self.sizes.nout), targets.shape())?;
        ensure_shape("outputs", (ndata, self.sizes.nout), pass.outputs.shape())?;
        ensure_shape("hidden1", (ndata, self.sizes.nhidden1 + 1), pass.hidden1.shape())?;
        ensure_shape("hidden2", (ndata, self.sizes.nhidden2 + 1), pass.hidden2.shape())?;
        return Ok(compute_gradients(inputs, pass, targets, &self.hidden2.weights, &self.output.weights, self.act));
    }

    /// Full-batch gradient descent with momentum for a fixed number of iterations.
    /// Inputs are raw features (N, nin), targets one-hot (N, nout). Returns the loss of every iteration.
    pub fn train(&mut self, inputs: &DMatrix<f64>, targets: &DMatrix<f64>, eta: f64, iterations: usize) -> Result<Vec<f64>> {
        let ndata = inputs.nrows();
        ensure_shape("inputs", (ndata, self.sizes.nin), inputs.shape())?;
        ensure_shape("targets", (ndata, self.sizes.nout), targets.shape())?;
        info!("starting training: {} samples, eta {}, {} iterations", ndata, eta, iterations);

        // the bias column is appended once, inputs stay unchanged for the whole run
        let inputs = augment_with_bias(inputs);
        // fresh accumulators for every run
        let mut optimizer = Momentum::new(self.momentum, self.weights());
        let mut costs: Vec<f64> = Vec::with_capacity(iterations);

        trace!("entering training loop");
        for iteration in 0..iterations {
            let pass = self.forward(&inputs)?;
            let cost = compute_cost(&pass.outputs, targets);
            if !cost.is_finite() {
                return Err(Error::NumericInstability(format!("loss became {} at iteration {}", cost, iteration)));
            }
            if iteration % LOG_EVERY == 0 {
                info!("Iteration: {} Error: {}", iteration, cost);
            }
            costs.push(cost);

            let grads = self.backward(&inputs, &pass, targets)?;
            let updates = optimizer.step(eta, &grads);
            self.update_params(updates);
        }
        trace!("training loop finished");
        return Ok(costs);
    }

    /// Classify raw features (M, nin) and compare against one-hot labels (M, nout)
    pub fn evaluate(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<Evaluation> {
        let nsamples = x.nrows();
        ensure_shape("evaluation inputs", (nsamples, self.sizes.nin), x.shape())?;
        ensure_shape("evaluation targets", (nsamples, self.sizes.nout), y.shape())?;
        let outputs = self.forward_pass(&augment_with_bias(x))?;
        let evaluation = Evaluation::from_predictions(&argmax_rows(&outputs), &argmax_rows(y), self.sizes.nout)?;
        info!("{}", evaluation);
        return Ok(evaluation);
    }

    // subtract this iteration's updates from the weights, the only place where weights change
    fn update_params(&mut self, updates: &[DMatrix<f64>; 3]) {
        self.hidden1.weights -= &updates[0];
        self.hidden2.weights -= &updates[1];
        self.output.weights -= &updates[2];
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const SIZES: Sizes = Sizes {
        nin: 3,
        nhidden1: 4,
        nhidden2: 5,
        nout: 2,
    };

    fn net(momentum: f64) -> Network {
        return Network::with_rng(SIZES, 1.0, momentum, &mut StdRng::seed_from_u64(42)).unwrap();
    }

    fn layer_mut(n: &mut Network, layer_idx: usize) -> &mut Layer {
        return match layer_idx {
            0 => &mut n.hidden1,
            1 => &mut n.hidden2,
            _ => &mut n.output,
        };
    }

    fn batch() -> (DMatrix<f64>, DMatrix<f64>) {
        let x = DMatrix::from_row_slice(4, 3, &[0.1, 0.2, 0.3, 1.0, -1.0, 0.5, -0.4, 0.8, 0.0, 0.9, 0.9, -0.9]);
        let y = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
        return (x, y);
    }

    #[test]
    fn weight_shapes_follow_sizes() {
        let n = net(0.9);
        let [w1, w2, w3] = n.weights();
        assert_eq!(w1.shape(), (4, 4));
        assert_eq!(w2.shape(), (5, 5));
        assert_eq!(w3.shape(), (6, 2));
        assert!(w1.iter().all(|w| return w.abs() <= 1.0 / 3f64.sqrt()));
        assert!(w3.iter().all(|w| return w.abs() <= 1.0 / 5f64.sqrt()));
    }

    #[test]
    fn zero_size_is_rejected() {
        let sizes = Sizes { nhidden2: 0, ..SIZES };
        assert!(matches!(Network::new(sizes, 1.0, 0.9), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn forward_keeps_bias_columns() {
        let n = net(0.9);
        let (x, _) = batch();
        let pass = n.forward(&augment_with_bias(&x)).unwrap();
        assert_eq!(pass.hidden1.shape(), (4, 5));
        assert_eq!(pass.hidden2.shape(), (4, 6));
        assert_eq!(pass.outputs.shape(), (4, 2));
        assert!(pass.hidden1.column(4).iter().all(|v| return *v == -1.0));
        assert!(pass.hidden2.column(5).iter().all(|v| return *v == -1.0));
    }

    #[test]
    fn forward_pass_requires_bias_column() {
        let n = net(0.9);
        let (x, _) = batch();
        assert!(matches!(n.forward_pass(&x), Err(Error::ShapeMismatch { what: "inputs", .. })));
    }

    #[test]
    fn backward_rejects_wrong_target_width() {
        let n = net(0.9);
        let (x, _) = batch();
        let inputs = augment_with_bias(&x);
        let pass = n.forward(&inputs).unwrap();
        let targets = DMatrix::<f64>::zeros(4, 3);
        assert!(matches!(n.backward(&inputs, &pass, &targets), Err(Error::ShapeMismatch { what: "targets", .. })));
    }

    #[test]
    fn gradient_shapes_match_weights() {
        let n = net(0.9);
        let (x, y) = batch();
        let inputs = augment_with_bias(&x);
        let pass = n.forward(&inputs).unwrap();
        let grads = n.backward(&inputs, &pass, &y).unwrap();
        for (grad, weights) in grads.as_array().iter().zip(n.weights()) {
            assert_eq!(grad.shape(), weights.shape());
        }
    }

    #[test]
    fn single_iteration_without_momentum_is_plain_descent() {
        let mut n = net(0.0);
        let (x, y) = batch();
        let inputs = augment_with_bias(&x);
        let pass = n.forward(&inputs).unwrap();
        let grads = n.backward(&inputs, &pass, &y).unwrap();
        let before: Vec<DMatrix<f64>> = n.weights().iter().map(|w| return (*w).clone()).collect();

        n.train(&x, &y, 0.5, 1).unwrap();

        for ((after, old), grad) in n.weights().iter().zip(&before).zip(grads.as_array()) {
            let expected = old - 0.5 * grad;
            assert_relative_eq!(**after, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn gradients_match_finite_differences() {
        let n = net(0.9);
        let (x, y) = batch();
        let inputs = augment_with_bias(&x);
        let grads = n.backward(&inputs, &n.forward(&inputs).unwrap(), &y).unwrap();
        let h = 1e-6;
        for layer_idx in 0..3 {
            let (nrows, ncols) = n.weights()[layer_idx].shape();
            for (r, c) in [(0, 0), (nrows - 1, ncols - 1), (nrows / 2, ncols / 2)] {
                let cost_at = |delta: f64| {
                    let mut probe = n.clone();
                    layer_mut(&mut probe, layer_idx).weights[(r, c)] += delta;
                    return compute_cost(&probe.forward_pass(&inputs).unwrap(), &y);
                };
                let numeric = (cost_at(h) - cost_at(-h)) / (2.0 * h);
                assert_relative_eq!(grads.as_array()[layer_idx][(r, c)], numeric, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn train_returns_one_cost_per_iteration() {
        let mut n = net(0.9);
        let (x, y) = batch();
        let costs = n.train(&x, &y, 0.1, 7).unwrap();
        assert_eq!(costs.len(), 7);
        assert!(costs.iter().all(|c| return c.is_finite() && *c >= 0.0));
    }

    #[test]
    fn train_rejects_augmented_inputs() {
        let mut n = net(0.9);
        let (x, y) = batch();
        let res = n.train(&augment_with_bias(&x), &y, 0.1, 1);
        assert!(matches!(res, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn overflowing_softmax_is_reported() {
        let mut n = net(0.9);
        n.output.weights.fill(1000.0);
        n.output.weights.row_mut(n.sizes.nhidden2).fill(-1000.0);
        let (x, _) = batch();
        // both outputs overflow to inf, inf / inf is NaN
        let res = n.forward_pass(&augment_with_bias(&x));
        assert!(matches!(res, Err(Error::NumericInstability(_))));
    }
}
