use ndarray::Array2;

use crate::error::ClassifierError;

/// A small trait abstraction for the binary classifiers used by the
/// cross-validation and evaluation code. Labels follow the crate convention
/// (1 for dementia, 0 for control).
pub trait ClassifierModel {
    /// Fit the model, overwriting any parameters from a previous fit.
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<(), ClassifierError>;

    /// Probability of the positive class for every row.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, ClassifierError>;

    /// Predicted labels. The default thresholds `predict_proba` at 0.5.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<i32>, ClassifierError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| if p >= 0.5 { 1 } else { 0 })
            .collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
