//! Small fully-connected binary classifier built on candle.
//!
//! Dense layers with ReLU and dropout feed a single sigmoid output. Training
//! uses binary cross-entropy, Adam, a held-out validation tail and early
//! stopping on validation loss.
use std::collections::HashMap;

use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Dropout, Linear, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::{ModelConfig, ModelType};
use crate::error::ClassifierError;
use crate::models::classifier_trait::ClassifierModel;

/// Hyper-parameters of [`FeedForwardNet`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardParams {
    pub hidden_layers: Vec<usize>,
    pub dropout: f32,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    pub early_stopping_patience: usize,
    pub validation_split: f32,
    pub restore_best_weights: bool,
    pub seed: u64,
}

impl FeedForwardParams {
    pub fn from_config(config: &ModelConfig) -> Result<Self, ClassifierError> {
        match &config.model_type {
            ModelType::FeedForward {
                hidden_layers,
                dropout,
                learning_rate,
                batch_size,
                max_epochs,
                early_stopping_patience,
                validation_split,
                restore_best_weights,
            } => {
                let params = FeedForwardParams {
                    hidden_layers: hidden_layers.clone(),
                    dropout: *dropout,
                    learning_rate: *learning_rate,
                    batch_size: *batch_size,
                    max_epochs: *max_epochs,
                    early_stopping_patience: *early_stopping_patience,
                    validation_split: *validation_split,
                    restore_best_weights: *restore_best_weights,
                    seed: config.seed,
                };
                params.validate()?;
                Ok(params)
            }
            other => Err(ClassifierError::InvalidConfig(format!(
                "expected feed_forward parameters, got {}",
                other.name()
            ))),
        }
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        let invalid = |msg: &str| Err(ClassifierError::InvalidConfig(msg.to_string()));
        if self.batch_size == 0 {
            return invalid("batch_size must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid("dropout must be in [0, 1)");
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return invalid("validation_split must be in [0, 1)");
        }
        if self.hidden_layers.iter().any(|&width| width == 0) {
            return invalid("hidden layer widths must be positive");
        }
        Ok(())
    }
}

/// Per-epoch metrics recorded while training, in the shape of a Keras `History`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingHistory {
    pub loss: Vec<f32>,
    pub accuracy: Vec<f32>,
    pub val_loss: Vec<f32>,
    pub val_accuracy: Vec<f32>,
    /// Zero-based epoch with the lowest validation loss.
    pub best_epoch: Option<usize>,
    /// Zero-based epoch at which early stopping ended training.
    pub stopped_epoch: Option<usize>,
}

impl TrainingHistory {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn last_val_accuracy(&self) -> Option<f32> {
        self.val_accuracy.last().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppingDecision {
    Improved,
    Continue,
    Stop,
}

/// Stops training once the monitored loss has not decreased for `patience` epochs.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best: f32,
    best_epoch: Option<usize>,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        EarlyStopping {
            patience,
            best: f32::INFINITY,
            best_epoch: None,
            wait: 0,
        }
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn update(&mut self, epoch: usize, loss: f32) -> StoppingDecision {
        self.wait += 1;
        if loss < self.best {
            self.best = loss;
            self.best_epoch = Some(epoch);
            self.wait = 0;
            return StoppingDecision::Improved;
        }
        if self.wait >= self.patience && epoch > 0 {
            StoppingDecision::Stop
        } else {
            StoppingDecision::Continue
        }
    }
}

/// Numerically stable binary cross-entropy on logits:
/// `mean(max(z, 0) - z * y + ln(1 + exp(-|z|)))`.
pub fn binary_cross_entropy_with_logits(
    logits: &Tensor,
    targets: &Tensor,
) -> candle_core::Result<Tensor> {
    let softplus = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    logits
        .relu()?
        .sub(&logits.mul(targets)?)?
        .add(&softplus)?
        .mean_all()
}

struct Network {
    varmap: VarMap,
    hidden: Vec<Linear>,
    output: Linear,
    dropout: Dropout,
}

impl Network {
    fn new(
        input_dim: usize,
        hidden_layers: &[usize],
        dropout: f32,
        device: &Device,
    ) -> candle_core::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let mut hidden = Vec::with_capacity(hidden_layers.len());
        let mut in_dim = input_dim;
        for (i, &width) in hidden_layers.iter().enumerate() {
            hidden.push(candle_nn::linear(in_dim, width, vb.pp(format!("dense_{}", i)))?);
            in_dim = width;
        }
        let output = candle_nn::linear(in_dim, 1, vb.pp("output"))?;

        Ok(Network {
            varmap,
            hidden,
            output,
            dropout: Dropout::new(dropout),
        })
    }

    /// Logits of shape (batch, 1).
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let mut out = xs.clone();
        for layer in &self.hidden {
            out = layer.forward(&out)?.relu()?;
            out = self.dropout.forward(&out, train)?;
        }
        self.output.forward(&out)
    }

    fn snapshot(&self) -> candle_core::Result<HashMap<String, Tensor>> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|e| candle_core::Error::Msg(format!("variable map poisoned: {}", e)))?;
        data.iter()
            .map(|(name, var)| Ok((name.clone(), var.as_tensor().copy()?)))
            .collect()
    }

    fn restore(&self, snapshot: &HashMap<String, Tensor>) -> candle_core::Result<()> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|e| candle_core::Error::Msg(format!("variable map poisoned: {}", e)))?;
        for (name, var) in data.iter() {
            if let Some(saved) = snapshot.get(name) {
                var.set(saved)?;
            }
        }
        Ok(())
    }
}

/// Feed-forward binary classifier (dense 24 → 12 → 8 → 1 by default).
pub struct FeedForwardNet {
    params: FeedForwardParams,
    device: Device,
    network: Option<Network>,
    history: Option<TrainingHistory>,
}

impl FeedForwardNet {
    pub fn new(config: ModelConfig) -> Result<Self, ClassifierError> {
        Ok(Self::with_params(FeedForwardParams::from_config(&config)?))
    }

    pub fn with_params(params: FeedForwardParams) -> Self {
        FeedForwardNet {
            params,
            device: Device::Cpu,
            network: None,
            history: None,
        }
    }

    pub fn params(&self) -> &FeedForwardParams {
        &self.params
    }

    /// First row of the validation tail that `fit` holds out from `n_samples` rows.
    pub fn validation_start(&self, n_samples: usize) -> usize {
        (n_samples as f64 * (1.0 - self.params.validation_split as f64)).floor() as usize
    }

    /// History of the most recent `fit`.
    pub fn history(&self) -> Option<&TrainingHistory> {
        self.history.as_ref()
    }

    fn to_tensor(&self, x: &Array2<f32>) -> candle_core::Result<Tensor> {
        let (rows, cols) = x.dim();
        let data: Vec<f32> = x.iter().copied().collect();
        Tensor::from_vec(data, (rows, cols), &self.device)
    }

    fn labels_tensor(&self, y: &[i32]) -> candle_core::Result<Tensor> {
        let data: Vec<f32> = y.iter().map(|&v| v as f32).collect();
        Tensor::from_vec(data, (y.len(), 1), &self.device)
    }

    /// Mean loss and accuracy of the network in inference mode.
    fn score(
        &self,
        network: &Network,
        x: &Array2<f32>,
        y: &[i32],
    ) -> candle_core::Result<(f32, f32)> {
        let logits = network.forward_t(&self.to_tensor(x)?, false)?;
        let loss = binary_cross_entropy_with_logits(&logits, &self.labels_tensor(y)?)?
            .to_scalar::<f32>()?;
        let correct = count_correct(&logits, y)?;
        Ok((loss, correct as f32 / y.len() as f32))
    }

    fn train(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<(), ClassifierError> {
        let n_samples = x.nrows();
        let split_at = self.validation_start(n_samples);
        if split_at == 0 || (self.params.validation_split > 0.0 && split_at == n_samples) {
            return Err(ClassifierError::InvalidConfig(format!(
                "validation_split {} leaves an empty train or validation set for {} rows",
                self.params.validation_split, n_samples
            )));
        }

        let train_idx: Vec<usize> = (0..split_at).collect();
        let val_idx: Vec<usize> = (split_at..n_samples).collect();
        let x_val = x.select(Axis(0), &val_idx);
        let y_val: Vec<i32> = val_idx.iter().map(|&i| y[i]).collect();

        let network = Network::new(
            x.ncols(),
            &self.params.hidden_layers,
            self.params.dropout,
            &self.device,
        )?;
        let mut optimizer = AdamW::new(
            network.varmap.all_vars(),
            ParamsAdamW {
                lr: self.params.learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        log::info!(
            "Training feed-forward network on {} rows ({} validation), {} features, up to {} epochs",
            train_idx.len(),
            val_idx.len(),
            x.ncols(),
            self.params.max_epochs
        );

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut stopping = EarlyStopping::new(self.params.early_stopping_patience);
        let mut history = TrainingHistory::default();
        let mut best_weights = None;
        let mut order = train_idx.clone();

        for epoch in 0..self.params.max_epochs {
            order.shuffle(&mut rng);

            let mut loss_sum = 0.0f32;
            let mut correct = 0usize;
            for batch in order.chunks(self.params.batch_size) {
                let xs = self.to_tensor(&x.select(Axis(0), batch))?;
                let batch_y: Vec<i32> = batch.iter().map(|&i| y[i]).collect();
                let ys = self.labels_tensor(&batch_y)?;

                let logits = network.forward_t(&xs, true)?;
                let loss = binary_cross_entropy_with_logits(&logits, &ys)?;
                optimizer.backward_step(&loss)?;

                loss_sum += loss.to_scalar::<f32>()? * batch.len() as f32;
                correct += count_correct(&logits, &batch_y)?;
            }
            history.loss.push(loss_sum / order.len() as f32);
            history.accuracy.push(correct as f32 / order.len() as f32);

            if val_idx.is_empty() {
                log::debug!("Epoch {}: loss {:.4}", epoch + 1, history.loss[epoch]);
                continue;
            }

            let (val_loss, val_accuracy) = self.score(&network, &x_val, &y_val)?;
            history.val_loss.push(val_loss);
            history.val_accuracy.push(val_accuracy);
            log::debug!(
                "Epoch {}: loss {:.4} - accuracy {:.4} - val_loss {:.4} - val_accuracy {:.4}",
                epoch + 1,
                history.loss[epoch],
                history.accuracy[epoch],
                val_loss,
                val_accuracy
            );

            match stopping.update(epoch, val_loss) {
                StoppingDecision::Improved if self.params.restore_best_weights => {
                    best_weights = Some(network.snapshot()?);
                }
                StoppingDecision::Stop => {
                    log::info!(
                        "Early stopping at epoch {}: val_loss has not improved for {} epochs",
                        epoch + 1,
                        self.params.early_stopping_patience
                    );
                    history.stopped_epoch = Some(epoch);
                    break;
                }
                _ => {}
            }
        }
        history.best_epoch = stopping.best_epoch();

        if let Some(weights) = best_weights {
            log::info!(
                "Restoring weights from epoch {}",
                history.best_epoch.map_or(0, |e| e + 1)
            );
            network.restore(&weights)?;
        }

        self.network = Some(network);
        self.history = Some(history);
        Ok(())
    }
}

fn count_correct(logits: &Tensor, y: &[i32]) -> candle_core::Result<usize> {
    let predicted = logits.flatten_all()?.to_vec1::<f32>()?;
    Ok(predicted
        .iter()
        .zip(y.iter())
        .filter(|(&z, &label)| (z >= 0.0) == (label == 1))
        .count())
}

impl ClassifierModel for FeedForwardNet {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<(), ClassifierError> {
        if x.nrows() == 0 {
            return Err(ClassifierError::EmptyDataset);
        }
        if y.len() != x.nrows() {
            return Err(ClassifierError::LengthMismatch {
                expected: x.nrows(),
                found: y.len(),
            });
        }
        if let Some(row) = y.iter().position(|&label| label != 0 && label != 1) {
            return Err(ClassifierError::UnknownLabel {
                row: row + 1,
                value: y[row].to_string(),
            });
        }
        self.train(x, y)
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, ClassifierError> {
        let network = self.network.as_ref().ok_or(ClassifierError::NotFitted)?;
        let expected = network.hidden.first().map_or_else(
            || network.output.weight().dim(1),
            |layer| layer.weight().dim(1),
        )?;
        if x.ncols() != expected {
            return Err(ClassifierError::FeatureMismatch {
                expected,
                found: x.ncols(),
            });
        }
        let logits = network.forward_t(&self.to_tensor(x)?, false)?;
        Ok(candle_nn::ops::sigmoid(&logits)?
            .flatten_all()?
            .to_vec1::<f32>()?)
    }

    fn name(&self) -> &str {
        "feed_forward"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_epochs: usize, patience: usize) -> FeedForwardParams {
        FeedForwardParams {
            hidden_layers: vec![8, 4],
            dropout: 0.0,
            learning_rate: 0.05,
            batch_size: 4,
            max_epochs,
            early_stopping_patience: patience,
            validation_split: 0.25,
            restore_best_weights: false,
            seed: 9,
        }
    }

    fn separable(n: usize) -> (Array2<f32>, Vec<i32>) {
        let mut values = Vec::with_capacity(n * 2);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let label = (i % 2) as i32;
            let centre = if label == 1 { 2.0 } else { -2.0 };
            let jitter = (i as f32 * 0.37).sin() * 0.3;
            values.push(centre + jitter);
            values.push(-centre + jitter);
            labels.push(label);
        }
        (Array2::from_shape_vec((n, 2), values).unwrap(), labels)
    }

    #[test]
    fn test_early_stopping_waits_for_patience() {
        let mut stopping = EarlyStopping::new(2);
        assert_eq!(stopping.update(0, 1.0), StoppingDecision::Improved);
        assert_eq!(stopping.update(1, 0.5), StoppingDecision::Improved);
        assert_eq!(stopping.update(2, 0.6), StoppingDecision::Continue);
        assert_eq!(stopping.update(3, 0.5), StoppingDecision::Stop);
        assert_eq!(stopping.best_epoch(), Some(1));
    }

    #[test]
    fn test_nan_loss_never_improves() {
        let mut stopping = EarlyStopping::new(1);
        assert_eq!(stopping.update(0, 0.3), StoppingDecision::Improved);
        assert_eq!(stopping.update(1, f32::NAN), StoppingDecision::Stop);
    }

    #[test]
    fn test_bce_matches_closed_form() {
        let device = Device::Cpu;
        let logits = Tensor::new(&[[0.0f32], [2.0]], &device).unwrap();
        let targets = Tensor::new(&[[1.0f32], [0.0]], &device).unwrap();
        let loss = binary_cross_entropy_with_logits(&logits, &targets)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        let expected = ((2.0f32).ln() + (1.0 + 2.0f32.exp()).ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-5, "loss {} vs {}", loss, expected);
    }

    #[test]
    fn test_learns_separable_data() {
        let (x, y) = separable(40);
        let mut model = FeedForwardNet::with_params(params(200, 200));
        model.fit(&x, &y).unwrap();

        let history = model.history().unwrap();
        assert_eq!(history.epochs(), history.val_loss.len());
        assert!(history.loss.last().unwrap() < &history.loss[0]);

        let predictions = model.predict(&x).unwrap();
        let correct = predictions.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct >= 36, "only {} of 40 correct", correct);
    }

    #[test]
    fn test_stops_before_max_epochs_when_validation_stalls() {
        let (x, _) = separable(40);
        // labels unrelated to the features: validation loss cannot keep improving
        let y: Vec<i32> = (0..40).map(|i| ((i / 3) % 2) as i32).collect();
        let mut model = FeedForwardNet::with_params(params(1000, 5));
        model.fit(&x, &y).unwrap();

        let history = model.history().unwrap();
        assert!(history.stopped_epoch.is_some());
        assert!(history.epochs() < 1000);
    }

    #[test]
    fn test_restore_best_weights_returns_to_lowest_validation_loss() {
        let (x, _) = separable(40);
        let y: Vec<i32> = (0..40).map(|i| ((i / 3) % 2) as i32).collect();
        let mut model = FeedForwardNet::with_params(FeedForwardParams {
            restore_best_weights: true,
            ..params(1000, 5)
        });
        model.fit(&x, &y).unwrap();

        let history = model.history().unwrap().clone();
        assert!(history.stopped_epoch.is_some());
        let best = history.best_epoch.unwrap();
        assert!(best < history.epochs() - 1);

        let start = model.validation_start(40);
        let val_idx: Vec<usize> = (start..40).collect();
        let x_val = x.select(Axis(0), &val_idx);
        let (val_loss, _) = model
            .score(model.network.as_ref().unwrap(), &x_val, &y[start..])
            .unwrap();
        assert!(
            (val_loss - history.val_loss[best]).abs() < 1e-4,
            "restored val_loss {} vs best {}",
            val_loss,
            history.val_loss[best]
        );
        assert!(val_loss <= *history.val_loss.last().unwrap());
    }

    #[test]
    fn test_rejects_gaussian_nb_config() {
        assert!(FeedForwardNet::new(ModelConfig::default()).is_err());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = FeedForwardNet::with_params(params(1, 1));
        let (x, _) = separable(4);
        assert!(matches!(
            model.predict_proba(&x),
            Err(ClassifierError::NotFitted)
        ));
    }
}
