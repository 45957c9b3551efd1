use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::cross_validation::FoldSelection;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelConfig {
    /// Seed for batch shuffling in iterative models.
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

fn default_seed() -> u64 {
    9
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ModelType {
    GaussianNb {
        /// Fraction of the largest feature variance added to every variance.
        var_smoothing: f64,
    },
    FeedForward {
        hidden_layers: Vec<usize>,
        dropout: f32,
        learning_rate: f64,
        batch_size: usize,
        max_epochs: usize,
        early_stopping_patience: usize,
        /// Fraction of rows, taken from the end of the training data, used for validation.
        validation_split: f32,
        restore_best_weights: bool,
    },
}

impl ModelType {
    pub fn gaussian_nb() -> Self {
        ModelType::GaussianNb { var_smoothing: 1e-9 }
    }

    pub fn feed_forward() -> Self {
        ModelType::FeedForward {
            hidden_layers: vec![24, 12, 8],
            dropout: 0.2,
            learning_rate: 1e-3,
            batch_size: 10,
            max_epochs: 1000,
            early_stopping_patience: 40,
            validation_split: 0.2,
            restore_best_weights: false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelType::GaussianNb { .. } => "gaussian_nb",
            ModelType::FeedForward { .. } => "feed_forward",
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::gaussian_nb()
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "gaussian_nb" | "naive_bayes" | "nb" => Ok(ModelType::gaussian_nb()),
            "feed_forward" | "neural" | "mlp" => Ok(ModelType::feed_forward()),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: gaussian_nb, feed_forward",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(seed: u64, model_type: ModelType) -> Self {
        Self { seed, model_type }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            model_type: ModelType::default(),
        }
    }
}

/// How raw tables are turned into labelled datasets.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    pub delimiter: char,
    pub label_column: String,
    /// Raw label value mapped to 1 (dementia).
    pub positive_label: String,
    /// Raw label value mapped to 0 (control).
    pub negative_label: String,
    /// Columns removed before training because they contain missing values.
    pub drop_columns: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            label_column: "dementia".to_string(),
            positive_label: "Y".to_string(),
            negative_label: "N".to_string(),
            drop_columns: vec!["pauses".to_string(), "retracing_reform".to_string()],
        }
    }
}

impl DatasetConfig {
    /// The delimiter as the single byte expected by the CSV reader.
    pub fn delimiter_byte(&self) -> Result<u8, String> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(format!("Delimiter must be an ASCII character, got '{}'", self.delimiter))
        }
    }
}

/// Parameters of the k-fold cross-validation loop.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
    pub fold_selection: FoldSelection,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle: true,
            seed: 9,
            fold_selection: FoldSelection::LastFold,
        }
    }
}
