//! Recurrent and dense layers with explicit forward caches and backward passes.
//!
//! Sequences are represented time-major: one `(batch, features)` matrix per step.

use super::optimizer::{Adam, Moments};
use ndarray::{Array1, Array2, Axis, Ix1, Ix2, s};
use rand::Rng;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot/Xavier uniform initialisation
fn glorot_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-limit..limit))
}

/// Inverted dropout mask: kept units are scaled by `1 / (1 - rate)`.
pub fn dropout_mask<R: Rng>(shape: (usize, usize), rate: f64, rng: &mut R) -> Array2<f64> {
    let keep_scale = 1.0 / (1.0 - rate);
    Array2::from_shape_fn(shape, |_| {
        if rng.random::<f64>() < rate {
            0.0
        } else {
            keep_scale
        }
    })
}

// ==================== LSTM ====================

/// LSTM layer with gates packed as `[input, forget, cell, output]`.
#[derive(Debug, Clone)]
pub struct LstmLayer {
    hidden_size: usize,
    kernel: Array2<f64>,    // [input_size x 4h]
    recurrent: Array2<f64>, // [h x 4h]
    bias: Array1<f64>,      // [4h]
    moments: Option<LstmMoments>,
}

#[derive(Debug, Clone)]
struct LstmMoments {
    kernel: Moments<Ix2>,
    recurrent: Moments<Ix2>,
    bias: Moments<Ix1>,
}

struct LstmStep {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    tanh_c: Array2<f64>,
}

/// Activations kept from a forward pass for backpropagation through time
pub struct LstmCache {
    steps: Vec<LstmStep>,
}

pub struct LstmGrads {
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

impl LstmLayer {
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let mut bias = Array1::zeros(4 * hidden_size);
        // Forget gate starts open
        bias.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            hidden_size,
            kernel: glorot_uniform(input_size, 4 * hidden_size, rng),
            recurrent: glorot_uniform(hidden_size, 4 * hidden_size, rng),
            bias,
            moments: None,
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Runs the sequence from a zero state and returns the hidden state of every step.
    pub fn forward(&self, inputs: &[Array2<f64>]) -> (Vec<Array2<f64>>, LstmCache) {
        let h = self.hidden_size;
        let batch = inputs.first().map_or(0, |x| x.nrows());

        let mut h_prev = Array2::zeros((batch, h));
        let mut c_prev = Array2::zeros((batch, h));
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut steps = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = x.dot(&self.kernel) + h_prev.dot(&self.recurrent) + &self.bias;

            let i = z.slice(s![.., 0..h]).mapv(sigmoid);
            let f = z.slice(s![.., h..2 * h]).mapv(sigmoid);
            let g = z.slice(s![.., 2 * h..3 * h]).mapv(f64::tanh);
            let o = z.slice(s![.., 3 * h..4 * h]).mapv(sigmoid);

            let c = &f * &c_prev + &i * &g;
            let tanh_c = c.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            outputs.push(h_next.clone());
            steps.push(LstmStep {
                x: x.clone(),
                h_prev,
                c_prev,
                i,
                f,
                g,
                o,
                tanh_c,
            });

            h_prev = h_next;
            c_prev = c;
        }

        (outputs, LstmCache { steps })
    }

    /// Backpropagation through time.
    ///
    /// `d_outputs[t]` is the loss gradient w.r.t. the hidden state emitted at
    /// step `t`. Returns the gradient w.r.t. each input step and the parameter
    /// gradients.
    pub fn backward(
        &self,
        cache: &LstmCache,
        d_outputs: &[Array2<f64>],
    ) -> (Vec<Array2<f64>>, LstmGrads) {
        let h = self.hidden_size;
        let mut grads = LstmGrads {
            kernel: Array2::zeros(self.kernel.raw_dim()),
            recurrent: Array2::zeros(self.recurrent.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        };

        let batch = cache.steps.first().map_or(0, |st| st.x.nrows());
        let mut d_h_next = Array2::<f64>::zeros((batch, h));
        let mut d_c_next = Array2::<f64>::zeros((batch, h));
        let mut d_inputs = vec![Array2::zeros((0, 0)); cache.steps.len()];
        let mut dz = Array2::<f64>::zeros((batch, 4 * h));

        for (t, step) in cache.steps.iter().enumerate().rev() {
            let d_h = &d_outputs[t] + &d_h_next;

            let d_o = &d_h * &step.tanh_c;
            let d_c = &d_h * &step.o * &step.tanh_c.mapv(|v| 1.0 - v * v) + &d_c_next;
            let d_i = &d_c * &step.g;
            let d_g = &d_c * &step.i;
            let d_f = &d_c * &step.c_prev;

            dz.slice_mut(s![.., 0..h])
                .assign(&(&d_i * &step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., h..2 * h])
                .assign(&(&d_f * &step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * h..3 * h])
                .assign(&(&d_g * &step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * h..4 * h])
                .assign(&(&d_o * &step.o.mapv(|v| v * (1.0 - v))));

            grads.kernel += &step.x.t().dot(&dz);
            grads.recurrent += &step.h_prev.t().dot(&dz);
            grads.bias += &dz.sum_axis(Axis(0));

            d_inputs[t] = dz.dot(&self.kernel.t());
            d_h_next = dz.dot(&self.recurrent.t());
            d_c_next = &d_c * &step.f;
        }

        (d_inputs, grads)
    }

    pub fn apply_gradients(&mut self, adam: &Adam, step_size: f64, grads: &LstmGrads) {
        let moments = self.moments.get_or_insert_with(|| LstmMoments {
            kernel: Moments::zeros_like(&self.kernel),
            recurrent: Moments::zeros_like(&self.recurrent),
            bias: Moments::zeros_like(&self.bias),
        });
        adam.update(step_size, &mut self.kernel, &grads.kernel, &mut moments.kernel);
        adam.update(
            step_size,
            &mut self.recurrent,
            &grads.recurrent,
            &mut moments.recurrent,
        );
        adam.update(step_size, &mut self.bias, &grads.bias, &mut moments.bias);
    }

    pub fn is_finite(&self) -> bool {
        self.kernel.iter().all(|v| v.is_finite())
            && self.recurrent.iter().all(|v| v.is_finite())
            && self.bias.iter().all(|v| v.is_finite())
    }
}

// ==================== Dense ====================

/// Fully-connected layer with linear activation
#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: Array2<f64>, // [input x output]
    biases: Array1<f64>,
    moments: Option<(Moments<Ix2>, Moments<Ix1>)>,
}

pub struct DenseGrads {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

impl DenseLayer {
    pub fn new<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        Self {
            weights: glorot_uniform(input_size, output_size, rng),
            biases: Array1::zeros(output_size),
            moments: None,
        }
    }

    pub fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        input.dot(&self.weights) + &self.biases
    }

    /// Returns the gradient w.r.t. `input` and the parameter gradients.
    pub fn backward(&self, input: &Array2<f64>, d_output: &Array2<f64>) -> (Array2<f64>, DenseGrads) {
        let grads = DenseGrads {
            weights: input.t().dot(d_output),
            biases: d_output.sum_axis(Axis(0)),
        };
        (d_output.dot(&self.weights.t()), grads)
    }

    pub fn apply_gradients(&mut self, adam: &Adam, step_size: f64, grads: &DenseGrads) {
        let (m_weights, m_biases) = self.moments.get_or_insert_with(|| {
            (
                Moments::zeros_like(&self.weights),
                Moments::zeros_like(&self.biases),
            )
        });
        adam.update(step_size, &mut self.weights, &grads.weights, m_weights);
        adam.update(step_size, &mut self.biases, &grads.biases, m_biases);
    }

    pub fn is_finite(&self) -> bool {
        self.weights.iter().all(|v| v.is_finite()) && self.biases.iter().all(|v| v.is_finite())
    }
}
