use std::error::Error;
use std::fmt;

/// Rate metrics derived from a binary confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMetric {
    Sensitivity,
    Specificity,
}

impl fmt::Display for RateMetric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RateMetric::Sensitivity => write!(f, "sensitivity"),
            RateMetric::Specificity => write!(f, "specificity"),
        }
    }
}

/// Errors raised while loading data, fitting models or computing metrics.
#[derive(Debug)]
pub enum ClassifierError {
    MissingColumn(String),
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    UnknownLabel {
        row: usize,
        value: String,
    },
    EmptyDataset,
    LengthMismatch {
        expected: usize,
        found: usize,
    },
    InvalidFolds {
        n_splits: usize,
        n_samples: usize,
    },
    NotFitted,
    InvalidConfig(String),
    FeatureMismatch {
        expected: usize,
        found: usize,
    },
    /// A rate whose denominator is zero because one class is absent from the evaluated set.
    UndefinedRate {
        metric: RateMetric,
        missing_class: i32,
    },
    Shape(ndarray::ShapeError),
    Candle(candle_core::Error),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassifierError::MissingColumn(name) => write!(f, "Missing expected column '{}'", name),
            ClassifierError::InvalidValue { row, column, value } => write!(
                f,
                "Invalid value '{}' in column '{}' at row {}",
                value, column, row
            ),
            ClassifierError::UnknownLabel { row, value } => {
                write!(f, "Unknown label value '{}' at row {}", value, row)
            }
            ClassifierError::EmptyDataset => write!(f, "Dataset contains no rows"),
            ClassifierError::LengthMismatch { expected, found } => write!(
                f,
                "Length mismatch: expected {} entries, found {}",
                expected, found
            ),
            ClassifierError::InvalidFolds { n_splits, n_samples } => write!(
                f,
                "Cannot split {} samples into {} folds (need 2 <= n_splits <= n_samples)",
                n_samples, n_splits
            ),
            ClassifierError::NotFitted => write!(f, "Model has not been fitted"),
            ClassifierError::InvalidConfig(msg) => write!(f, "Invalid model configuration: {}", msg),
            ClassifierError::FeatureMismatch { expected, found } => write!(
                f,
                "Model was fitted on {} features but received {}",
                expected, found
            ),
            ClassifierError::UndefinedRate { metric, missing_class } => write!(
                f,
                "{} is undefined: no samples with true label {} in the evaluated set",
                metric, missing_class
            ),
            ClassifierError::Shape(e) => write!(f, "Shape error: {}", e),
            ClassifierError::Candle(e) => write!(f, "Tensor error: {}", e),
        }
    }
}

impl Error for ClassifierError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClassifierError::Shape(e) => Some(e),
            ClassifierError::Candle(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ndarray::ShapeError> for ClassifierError {
    fn from(e: ndarray::ShapeError) -> Self {
        ClassifierError::Shape(e)
    }
}

impl From<candle_core::Error> for ClassifierError {
    fn from(e: candle_core::Error) -> Self {
        ClassifierError::Candle(e)
    }
}
