use std::f64::consts::PI;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use statrs::statistics::Statistics;

use crate::error::ClassifierError;
use crate::models::classifier_trait::ClassifierModel;

/// Floor for per-class variances when every feature is constant.
const MIN_VARIANCE: f64 = 1e-12;

/// Fitted per-class Gaussian parameters.
#[derive(Debug, Clone, PartialEq)]
struct ClassStats {
    label: i32,
    log_prior: f64,
    means: Vec<f64>,
    variances: Vec<f64>,
}

/// Gaussian Naive Bayes classifier.
///
/// Every feature is modelled as an independent normal distribution within
/// each class. Like scikit-learn's `GaussianNB`, a fraction `var_smoothing`
/// of the largest feature variance is added to all variances.
#[derive(Debug, Clone)]
pub struct GaussianNaiveBayes {
    var_smoothing: f64,
    classes: Option<Vec<ClassStats>>,
}

impl GaussianNaiveBayes {
    pub fn new(var_smoothing: f64) -> Self {
        GaussianNaiveBayes {
            var_smoothing,
            classes: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.classes.is_some()
    }

    /// Labels seen during the last fit, in ascending order.
    pub fn classes(&self) -> Option<Vec<i32>> {
        self.classes
            .as_ref()
            .map(|stats| stats.iter().map(|c| c.label).collect())
    }

    fn fitted(&self, x: &Array2<f32>) -> Result<&[ClassStats], ClassifierError> {
        let classes = self.classes.as_deref().ok_or(ClassifierError::NotFitted)?;
        let expected = classes[0].means.len();
        if x.ncols() != expected {
            return Err(ClassifierError::FeatureMismatch {
                expected,
                found: x.ncols(),
            });
        }
        Ok(classes)
    }

    /// Unnormalised log posterior of each class for one row.
    fn joint_log_likelihood(classes: &[ClassStats], row: ArrayView1<f32>) -> Vec<f64> {
        classes
            .iter()
            .map(|class| {
                let log_likelihood: f64 = row
                    .iter()
                    .zip(class.means.iter().zip(class.variances.iter()))
                    .map(|(&value, (&mean, &variance))| {
                        let diff = value as f64 - mean;
                        -0.5 * (2.0 * PI * variance).ln() - diff * diff / (2.0 * variance)
                    })
                    .sum();
                class.log_prior + log_likelihood
            })
            .collect()
    }
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        GaussianNaiveBayes::new(1e-9)
    }
}

impl ClassifierModel for GaussianNaiveBayes {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<(), ClassifierError> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(ClassifierError::EmptyDataset);
        }
        if y.len() != n_samples {
            return Err(ClassifierError::LengthMismatch {
                expected: n_samples,
                found: y.len(),
            });
        }
        if let Some(row) = y.iter().position(|&label| label != 0 && label != 1) {
            return Err(ClassifierError::UnknownLabel {
                row: row + 1,
                value: y[row].to_string(),
            });
        }

        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|c| x.column(c).iter().map(|&v| v as f64).collect())
            .collect();
        let max_variance = columns
            .iter()
            .map(|col| col.iter().population_variance())
            .fold(0.0_f64, f64::max);
        let epsilon = self.var_smoothing * max_variance;

        let mut labels = y.to_vec();
        labels.sort_unstable();
        labels.dedup();

        let stats = labels
            .into_iter()
            .map(|label| {
                let rows: Vec<usize> = (0..n_samples).filter(|&r| y[r] == label).collect();
                let (means, variances) = columns
                    .iter()
                    .map(|col| {
                        let values: Vec<f64> = rows.iter().map(|&r| col[r]).collect();
                        let mean = values.iter().mean();
                        let variance =
                            (values.iter().population_variance() + epsilon).max(MIN_VARIANCE);
                        (mean, variance)
                    })
                    .unzip();
                ClassStats {
                    label,
                    log_prior: (rows.len() as f64 / n_samples as f64).ln(),
                    means,
                    variances,
                }
            })
            .collect::<Vec<_>>();

        log::trace!(
            "Fitted Gaussian NB on {} rows x {} features ({} classes, epsilon {:e})",
            n_samples,
            n_features,
            stats.len(),
            epsilon
        );

        self.classes = Some(stats);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, ClassifierError> {
        let classes = self.fitted(x)?;
        let positive = classes.iter().position(|c| c.label == 1);

        Ok((0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let Some(positive) = positive else {
                    return 0.0;
                };
                let jll = Self::joint_log_likelihood(classes, x.row(r));
                let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let norm: f64 = jll.iter().map(|v| (v - max).exp()).sum();
                ((jll[positive] - max).exp() / norm) as f32
            })
            .collect())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<i32>, ClassifierError> {
        let classes = self.fitted(x)?;

        Ok((0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let jll = Self::joint_log_likelihood(classes, x.row(r));
                // first maximum wins on ties
                let mut best = 0;
                for (i, &v) in jll.iter().enumerate() {
                    if v > jll[best] {
                        best = i;
                    }
                }
                classes[best].label
            })
            .collect())
    }

    fn name(&self) -> &str {
        "gaussian_nb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters() -> (Array2<f32>, Vec<i32>) {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                0.1, 1.0, 0.2, 1.1, -0.1, 0.9, 0.0, 1.2, // control
                5.0, -2.0, 5.2, -2.1, 4.9, -1.8, 5.1, -2.2, // dementia
            ],
        )
        .unwrap();
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    #[test]
    fn test_separates_clusters() {
        let (x, y) = clusters();
        let mut model = GaussianNaiveBayes::default();
        model.fit(&x, &y).unwrap();

        assert_eq!(model.predict(&x).unwrap(), y);
        let probs = model.predict_proba(&x).unwrap();
        assert!(probs[..4].iter().all(|&p| p < 0.01));
        assert!(probs[4..].iter().all(|&p| p > 0.99));
    }

    #[test]
    fn test_refit_overwrites_parameters() {
        let (x, y) = clusters();
        let flipped: Vec<i32> = y.iter().map(|v| 1 - v).collect();
        let mut model = GaussianNaiveBayes::default();
        model.fit(&x, &y).unwrap();
        model.fit(&x, &flipped).unwrap();
        assert_eq!(model.predict(&x).unwrap(), flipped);
    }

    #[test]
    fn test_single_class_fit_predicts_that_class() {
        let (x, _) = clusters();
        let mut model = GaussianNaiveBayes::default();
        model.fit(&x, &[0; 8]).unwrap();
        assert_eq!(model.classes(), Some(vec![0]));
        assert_eq!(model.predict(&x).unwrap(), vec![0; 8]);
        assert!(model.predict_proba(&x).unwrap().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_unfitted_and_mismatched_inputs() {
        let (x, y) = clusters();
        let mut model = GaussianNaiveBayes::default();
        assert!(matches!(model.predict(&x), Err(ClassifierError::NotFitted)));

        model.fit(&x, &y).unwrap();
        let narrow = Array2::<f32>::zeros((2, 1));
        assert!(matches!(
            model.predict(&narrow),
            Err(ClassifierError::FeatureMismatch { expected: 2, found: 1 })
        ));
        assert!(model.fit(&x, &y[..3]).is_err());
    }
}
