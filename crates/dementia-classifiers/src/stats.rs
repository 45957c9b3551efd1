use serde::Serialize;

use crate::data_handling::Dataset;
use crate::error::{ClassifierError, RateMetric};
use crate::models::classifier_trait::ClassifierModel;

/// Counts of a binary confusion matrix (label 1 is the positive class).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionCounts {
    /// Match predicted labels against the true ones.
    ///
    /// # Arguments
    ///
    /// * `y_true` - True labels in {0, 1}.
    /// * `y_pred` - Predicted labels in {0, 1}, same length as `y_true`.
    ///
    /// # Returns
    ///
    /// The four counts; they always sum to `y_true.len()`.
    pub fn from_labels(y_true: &[i32], y_pred: &[i32]) -> Result<Self, ClassifierError> {
        if y_true.len() != y_pred.len() {
            return Err(ClassifierError::LengthMismatch {
                expected: y_true.len(),
                found: y_pred.len(),
            });
        }

        let mut counts = ConfusionCounts::default();
        for (row, (&truth, &pred)) in y_true.iter().zip(y_pred.iter()).enumerate() {
            match (truth, pred) {
                (0, 0) => counts.tn += 1,
                (0, 1) => counts.fp += 1,
                (1, 0) => counts.fn_ += 1,
                (1, 1) => counts.tp += 1,
                (0 | 1, other) | (other, _) => {
                    return Err(ClassifierError::UnknownLabel {
                        row: row + 1,
                        value: other.to_string(),
                    })
                }
            }
        }
        Ok(counts)
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn accuracy(&self) -> Result<f64, ClassifierError> {
        if self.total() == 0 {
            return Err(ClassifierError::EmptyDataset);
        }
        Ok((self.tp + self.tn) as f64 / self.total() as f64)
    }

    /// True-positive rate, tp / (tp + fn).
    pub fn sensitivity(&self) -> Result<f64, ClassifierError> {
        rate(self.tp, self.fn_, RateMetric::Sensitivity, 1)
    }

    /// True-negative rate, tn / (tn + fp).
    pub fn specificity(&self) -> Result<f64, ClassifierError> {
        rate(self.tn, self.fp, RateMetric::Specificity, 0)
    }
}

fn rate(
    hits: usize,
    misses: usize,
    metric: RateMetric,
    class: i32,
) -> Result<f64, ClassifierError> {
    let denominator = hits + misses;
    if denominator == 0 {
        return Err(ClassifierError::UndefinedRate {
            metric,
            missing_class: class,
        });
    }
    Ok(hits as f64 / denominator as f64)
}

/// Fraction of predictions that equal the true label.
pub fn accuracy(y_true: &[i32], y_pred: &[i32]) -> Result<f64, ClassifierError> {
    if y_true.len() != y_pred.len() {
        return Err(ClassifierError::LengthMismatch {
            expected: y_true.len(),
            found: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ClassifierError::EmptyDataset);
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Metrics of a fitted model on one named split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitEvaluation {
    pub split: String,
    pub n_samples: usize,
    pub accuracy: f64,
    pub confusion: ConfusionCounts,
    /// `None` when the split has no dementia rows.
    pub sensitivity: Option<f64>,
    /// `None` when the split has no control rows.
    pub specificity: Option<f64>,
}

/// Score `model` on `dataset`.
///
/// Undefined rates are logged as warnings and stored as `None`; they are never
/// reported as 0%.
pub fn evaluate(
    model: &dyn ClassifierModel,
    dataset: &Dataset,
    split: &str,
) -> Result<SplitEvaluation, ClassifierError> {
    if dataset.is_empty() {
        return Err(ClassifierError::EmptyDataset);
    }
    let y_true = dataset.labels();
    let y_pred = model.predict(&dataset.x)?;
    let confusion = ConfusionCounts::from_labels(&y_true, &y_pred)?;

    log::debug!("Confusion counts on {} set: {:?}", split, confusion);

    Ok(SplitEvaluation {
        split: split.to_string(),
        n_samples: dataset.n_samples(),
        accuracy: confusion.accuracy()?,
        confusion,
        sensitivity: defined_or_warn(confusion.sensitivity(), split)?,
        specificity: defined_or_warn(confusion.specificity(), split)?,
    })
}

fn defined_or_warn(
    value: Result<f64, ClassifierError>,
    split: &str,
) -> Result<Option<f64>, ClassifierError> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(e @ ClassifierError::UndefinedRate { .. }) => {
            log::warn!("On {} set: {}", split, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        let y_true = [1, 1, 1, 1, 0, 0, 0, 0];
        let y_pred = [1, 1, 0, 1, 0, 0, 1, 0];
        let counts = ConfusionCounts::from_labels(&y_true, &y_pred).unwrap();
        assert_eq!(
            counts,
            ConfusionCounts {
                tn: 3,
                fp: 1,
                fn_: 1,
                tp: 3
            }
        );
        assert_eq!(counts.sensitivity().unwrap(), 0.75);
        assert_eq!(counts.specificity().unwrap(), 0.75);
        assert_eq!(counts.accuracy().unwrap(), accuracy(&y_true, &y_pred).unwrap());
    }

    #[test]
    fn test_only_controls_has_undefined_sensitivity() {
        let counts = ConfusionCounts::from_labels(&[0, 0, 0], &[0, 1, 0]).unwrap();
        match counts.sensitivity() {
            Err(ClassifierError::UndefinedRate {
                metric: RateMetric::Sensitivity,
                missing_class: 1,
            }) => {}
            other => panic!("expected undefined sensitivity, got {:?}", other),
        }
        assert!((counts.specificity().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_binary_label_is_rejected() {
        assert!(ConfusionCounts::from_labels(&[0, 2], &[0, 1]).is_err());
        assert!(ConfusionCounts::from_labels(&[0, 1], &[0, -1]).is_err());
    }

    #[test]
    fn test_empty_accuracy_is_an_error() {
        assert!(accuracy(&[], &[]).is_err());
        assert!(ConfusionCounts::default().accuracy().is_err());
    }
}
