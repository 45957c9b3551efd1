//! Per-column standardisation of feature matrices.
//!
//! The scaler is fitted on training rows only and then applied unchanged to
//! validation and test rows.

use ndarray::{Array1, Array2, Axis};

use crate::error::ClassifierError;

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
    pub mean: Array1<f32>,
    pub std: Array1<f32>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f32 = 1e-6;

    /// Fit a `Scaler` where rows are samples and columns are features.
    pub fn fit(x: &Array2<f32>) -> Result<Scaler, ClassifierError> {
        let mean = x.mean_axis(Axis(0)).ok_or(ClassifierError::EmptyDataset)?;
        let std = x.std_axis(Axis(0), 0.0).mapv(|s| s.max(Self::MIN_STD));
        Ok(Scaler { mean, std })
    }

    pub fn transform(&self, x: &Array2<f32>) -> Result<Array2<f32>, ClassifierError> {
        if x.ncols() != self.mean.len() {
            return Err(ClassifierError::FeatureMismatch {
                expected: self.mean.len(),
                found: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.std)
    }
}

/// Fit a scaler and return it together with the transformed matrix.
pub fn fit_transform(x: &Array2<f32>) -> Result<(Scaler, Array2<f32>), ClassifierError> {
    let scaler = Scaler::fit(x)?;
    let transformed = scaler.transform(x)?;
    Ok((scaler, transformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_centres_columns() {
        let x = array![[1.0f32, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let (scaler, scaled) = fit_transform(&x).unwrap();

        assert_eq!(scaler.mean, array![3.0f32, 10.0]);
        for col in scaled.columns() {
            assert!(col.sum().abs() < 1e-5);
        }
        // constant column is centred, not divided by zero
        assert!(scaled.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_uses_fitted_statistics() {
        let scaler = Scaler::fit(&array![[0.0f32], [2.0]]).unwrap();
        let other = scaler.transform(&array![[4.0f32]]).unwrap();
        assert!((other[(0, 0)] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_width_and_empty_checks() {
        let scaler = Scaler::fit(&array![[1.0f32, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0f32]]),
            Err(ClassifierError::FeatureMismatch { expected: 2, found: 1 })
        ));
        assert!(Scaler::fit(&Array2::<f32>::zeros((0, 2))).is_err());
    }
}
