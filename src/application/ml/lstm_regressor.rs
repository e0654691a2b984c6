use super::layers::{DenseLayer, LstmCache, LstmLayer, dropout_mask};
use super::optimizer::Adam;
use super::predictor::{FitParams, FitReport, SequenceRegressionModel};
use crate::domain::errors::ForecastError;
use crate::domain::ml::{WINDOW_LENGTH, Window};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::trace;

/// Architecture and optimizer settings of the stacked LSTM
#[derive(Debug, Clone, PartialEq)]
pub struct LstmRegressorConfig {
    pub window_length: usize,
    pub recurrent_layers: usize,
    pub hidden_units: usize,
    pub dense_units: usize,
    pub dropout_rate: f64,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl Default for LstmRegressorConfig {
    fn default() -> Self {
        Self {
            window_length: WINDOW_LENGTH,
            recurrent_layers: 3,
            hidden_units: 20,
            dense_units: 25,
            dropout_rate: 0.2,
            learning_rate: 0.001,
            seed: None,
        }
    }
}

/// Three stacked LSTM layers (the last one collapsing to its final hidden
/// state), dropout after each, then Dense(25) and Dense(1).
pub struct StackedLstmRegressor {
    config: LstmRegressorConfig,
    recurrent: Vec<LstmLayer>,
    dense_hidden: DenseLayer,
    dense_output: DenseLayer,
    adam: Adam,
    rng: StdRng,
}

/// One dropout mask per emitted step, per recurrent layer
struct DropoutMasks {
    layers: Vec<Vec<Array2<f64>>>,
}

struct ForwardPass {
    caches: Vec<LstmCache>,
    dense_input: Array2<f64>,
    dense_hidden_out: Array2<f64>,
    output: Array2<f64>,
}

impl StackedLstmRegressor {
    pub fn new(config: LstmRegressorConfig) -> Self {
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let mut recurrent = Vec::with_capacity(config.recurrent_layers);
        let mut input_size = 1;
        for _ in 0..config.recurrent_layers {
            recurrent.push(LstmLayer::new(input_size, config.hidden_units, &mut rng));
            input_size = config.hidden_units;
        }
        let dense_hidden = DenseLayer::new(config.hidden_units, config.dense_units, &mut rng);
        let dense_output = DenseLayer::new(config.dense_units, 1, &mut rng);
        let adam = Adam::new(config.learning_rate);

        Self {
            config,
            recurrent,
            dense_hidden,
            dense_output,
            adam,
            rng,
        }
    }

    pub fn config(&self) -> &LstmRegressorConfig {
        &self.config
    }

    /// Time-major batch: step `t` is a `(batch, 1)` matrix of the t-th value of each window.
    fn to_sequence(&self, windows: &[&[f64]]) -> Vec<Array2<f64>> {
        (0..self.config.window_length)
            .map(|t| Array2::from_shape_fn((windows.len(), 1), |(b, _)| windows[b][t]))
            .collect()
    }

    fn sample_masks(&mut self, batch: usize) -> DropoutMasks {
        let last = self.recurrent.len().saturating_sub(1);
        let shape = (batch, self.config.hidden_units);
        let (window_length, rate) = (self.config.window_length, self.config.dropout_rate);
        let rng = &mut self.rng;

        let mut layers = Vec::with_capacity(self.recurrent.len());
        for idx in 0..self.recurrent.len() {
            let steps = if idx == last { 1 } else { window_length };
            layers.push((0..steps).map(|_| dropout_mask(shape, rate, rng)).collect());
        }
        DropoutMasks { layers }
    }

    fn forward(&self, sequence: &[Array2<f64>], masks: Option<&DropoutMasks>) -> ForwardPass {
        let batch = sequence.first().map_or(0, |x| x.nrows());
        let last = self.recurrent.len().saturating_sub(1);
        let mut caches = Vec::with_capacity(self.recurrent.len());
        let mut current = sequence.to_vec();

        for (idx, layer) in self.recurrent.iter().enumerate() {
            let (outputs, cache) = layer.forward(&current);
            caches.push(cache);

            current = if idx == last {
                let final_state = outputs
                    .into_iter()
                    .last()
                    .unwrap_or_else(|| Array2::zeros((batch, layer.hidden_size())));
                vec![final_state]
            } else {
                outputs
            };

            if let Some(masks) = masks {
                for (h, mask) in current.iter_mut().zip(&masks.layers[idx]) {
                    *h *= mask;
                }
            }
        }

        let dense_input = current
            .pop()
            .unwrap_or_else(|| Array2::zeros((batch, self.config.hidden_units)));
        let dense_hidden_out = self.dense_hidden.forward(&dense_input);
        let output = self.dense_output.forward(&dense_hidden_out);

        ForwardPass {
            caches,
            dense_input,
            dense_hidden_out,
            output,
        }
    }

    /// Backpropagates `d_output` and applies one Adam step to every layer.
    fn backward_and_update(&mut self, pass: &ForwardPass, masks: &DropoutMasks, d_output: &Array2<f64>) {
        let (d_hidden, output_grads) = self.dense_output.backward(&pass.dense_hidden_out, d_output);
        let (d_dense_input, hidden_grads) = self.dense_hidden.backward(&pass.dense_input, &d_hidden);

        let last = self.recurrent.len().saturating_sub(1);
        let steps = self.config.window_length;
        let mut recurrent_grads = Vec::with_capacity(self.recurrent.len());
        let mut d_current = vec![d_dense_input];

        for idx in (0..self.recurrent.len()).rev() {
            for (d, mask) in d_current.iter_mut().zip(&masks.layers[idx]) {
                *d *= mask;
            }

            let d_outputs = if idx == last {
                // Only the final step fed the dense head
                let collapsed = d_current.pop().unwrap_or_default();
                let mut per_step: Vec<Array2<f64>> = (0..steps.saturating_sub(1))
                    .map(|_| Array2::zeros(collapsed.raw_dim()))
                    .collect();
                per_step.push(collapsed);
                per_step
            } else {
                d_current
            };

            let (d_inputs, grads) = self.recurrent[idx].backward(&pass.caches[idx], &d_outputs);
            recurrent_grads.push(grads);
            d_current = d_inputs;
        }
        recurrent_grads.reverse();

        let step_size = self.adam.begin_step();
        self.dense_output
            .apply_gradients(&self.adam, step_size, &output_grads);
        self.dense_hidden
            .apply_gradients(&self.adam, step_size, &hidden_grads);
        for (layer, grads) in self.recurrent.iter_mut().zip(&recurrent_grads) {
            layer.apply_gradients(&self.adam, step_size, grads);
        }
    }

    /// Mean squared error over `windows` with dropout disabled.
    fn evaluate(&self, windows: &[Window], batch_size: usize) -> f64 {
        if windows.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for chunk in windows.chunks(batch_size.max(1)) {
            let inputs: Vec<&[f64]> = chunk.iter().map(|w| w.inputs.as_slice()).collect();
            let pass = self.forward(&self.to_sequence(&inputs), None);
            total += chunk
                .iter()
                .zip(pass.output.column(0))
                .map(|(w, &y)| (y - w.target).powi(2))
                .sum::<f64>();
        }
        total / windows.len() as f64
    }

    fn is_finite(&self) -> bool {
        self.recurrent.iter().all(LstmLayer::is_finite)
            && self.dense_hidden.is_finite()
            && self.dense_output.is_finite()
    }

    fn check_window(&self, inputs: &[f64]) -> Result<(), String> {
        if inputs.len() != self.config.window_length {
            return Err(format!(
                "expected window of {} values, got {}",
                self.config.window_length,
                inputs.len()
            ));
        }
        if inputs.iter().any(|v| !v.is_finite()) {
            return Err("window contains non-finite values".to_string());
        }
        Ok(())
    }
}

impl SequenceRegressionModel for StackedLstmRegressor {
    fn fit(
        &mut self,
        train: &[Window],
        validation: &[Window],
        params: &FitParams,
    ) -> Result<FitReport, ForecastError> {
        if train.is_empty() {
            return Err(ForecastError::training("no training samples"));
        }
        for window in train.iter().chain(validation) {
            self.check_window(&window.inputs)
                .map_err(ForecastError::training)?;
        }

        let batch_size = params.batch_size.max(1);
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut train_loss = f64::NAN;
        let mut validation_loss = f64::NAN;

        for epoch in 1..=params.epochs {
            order.shuffle(&mut self.rng);
            let mut epoch_loss = 0.0;

            for chunk in order.chunks(batch_size) {
                let inputs: Vec<&[f64]> = chunk.iter().map(|&i| train[i].inputs.as_slice()).collect();
                let targets = Array2::from_shape_fn((chunk.len(), 1), |(b, _)| train[chunk[b]].target);

                let masks = self.sample_masks(chunk.len());
                let pass = self.forward(&self.to_sequence(&inputs), Some(&masks));

                let diff = &pass.output - &targets;
                let batch_loss = diff.mapv(|d| d * d).mean().unwrap_or(f64::NAN);
                if !batch_loss.is_finite() {
                    return Err(ForecastError::training(format!(
                        "non-finite loss at epoch {}",
                        epoch
                    )));
                }
                epoch_loss += batch_loss * chunk.len() as f64;

                let d_output = diff * (2.0 / chunk.len() as f64);
                self.backward_and_update(&pass, &masks, &d_output);
            }

            train_loss = epoch_loss / train.len() as f64;
            validation_loss = self.evaluate(validation, batch_size);
            trace!(
                "StackedLstmRegressor: epoch {}/{} loss={:.6} val_loss={:.6} (step {})",
                epoch,
                params.epochs,
                train_loss,
                validation_loss,
                self.adam.steps_taken()
            );
        }

        if !self.is_finite() || (params.epochs > 0 && !validation_loss.is_finite()) {
            return Err(ForecastError::training(
                "weights diverged to non-finite values",
            ));
        }

        Ok(FitReport {
            epochs_run: params.epochs,
            train_loss,
            validation_loss,
        })
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ForecastError> {
        self.check_window(window).map_err(ForecastError::inference)?;

        let pass = self.forward(&self.to_sequence(&[window]), None);
        let value = pass.output[[0, 0]];
        if !value.is_finite() {
            return Err(ForecastError::inference(format!(
                "model produced non-finite output {}",
                value
            )));
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "Stacked LSTM (3x20, dropout 0.2)"
    }
}
