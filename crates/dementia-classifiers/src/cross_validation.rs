use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data_handling::Dataset;
use crate::error::ClassifierError;
use crate::models::classifier_trait::ClassifierModel;
use crate::stats::accuracy;

/// Row indices of one cross-validation iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// K-fold splitter with optional seeded shuffling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: u64,
}

impl KFold {
    pub fn new(n_splits: usize, shuffle: bool, random_state: u64) -> Self {
        KFold {
            n_splits,
            shuffle,
            random_state,
        }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Partition `0..n_samples` into `n_splits` folds.
    ///
    /// Indices are shuffled with a `StdRng` seeded from `random_state`, then cut
    /// into contiguous validation groups; the first `n_samples % n_splits`
    /// groups hold one extra row. Each fold trains on the remaining groups.
    ///
    /// # Arguments
    ///
    /// * `n_samples` - Number of rows to partition.
    ///
    /// # Returns
    ///
    /// One `Fold` per split, or `InvalidFolds` unless `2 <= n_splits <= n_samples`.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>, ClassifierError> {
        if self.n_splits < 2 || self.n_splits > n_samples {
            return Err(ClassifierError::InvalidFolds {
                n_splits: self.n_splits,
                n_samples,
            });
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.random_state);
            indices.shuffle(&mut rng);
        }

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            let end = start + fold_size + usize::from(i < remainder);

            let mut train = Vec::with_capacity(n_samples - (end - start));
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);

            folds.push(Fold {
                train,
                validation: indices[start..end].to_vec(),
            });
            start = end;
        }

        Ok(folds)
    }
}

/// Which fold's fit the cross-validation loop hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldSelection {
    /// Refit on every fold in turn and keep the final fit.
    #[default]
    LastFold,
    /// Refit on the fold with the highest validation accuracy (earliest on ties).
    BestValidationAccuracy,
}

impl std::str::FromStr for FoldSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "last_fold" | "last" => Ok(FoldSelection::LastFold),
            "best_validation_accuracy" | "best_validation" | "best" => {
                Ok(FoldSelection::BestValidationAccuracy)
            }
            _ => Err(format!(
                "Unknown fold selection: {}. Expected last-fold or best-validation",
                s
            )),
        }
    }
}

/// Outcome of [`cross_validate`].
#[derive(Debug, Clone)]
pub struct CrossValidation {
    pub folds: Vec<Fold>,
    /// Validation accuracy of each fold's fit, in fold order.
    pub fold_accuracies: Vec<f64>,
    /// Index of the fold whose fit the model holds.
    pub selected_fold: usize,
    /// Training portion of the selected fold.
    pub train: Dataset,
    /// Held-out portion of the selected fold.
    pub validation: Dataset,
}

impl CrossValidation {
    pub fn mean_accuracy(&self) -> f64 {
        self.fold_accuracies.iter().sum::<f64>() / self.fold_accuracies.len() as f64
    }
}

/// Fit `model` on each fold's training rows in turn.
///
/// The model's parameters are overwritten on every fold. With
/// `FoldSelection::LastFold` the model ends up holding the final fold's fit.
/// With `BestValidationAccuracy` it is refit on the best fold's training rows
/// after the loop, unless that fold is the last one. The refit is exact for
/// deterministic models; a network with unseeded initial weights may land on a
/// different fit than the one scored during the loop.
pub fn cross_validate(
    model: &mut dyn ClassifierModel,
    dataset: &Dataset,
    kfold: &KFold,
    selection: FoldSelection,
) -> Result<CrossValidation, ClassifierError> {
    let folds = kfold.split(dataset.n_samples())?;
    let mut fold_accuracies = Vec::with_capacity(folds.len());

    for (i, fold) in folds.iter().enumerate() {
        let train = dataset.select_rows(&fold.train);
        let validation = dataset.select_rows(&fold.validation);

        log::trace!(
            "Preparing fold {} with {} training rows and {} validation rows",
            i,
            train.n_samples(),
            validation.n_samples()
        );

        model.fit(&train.x, &train.labels())?;
        let fold_accuracy = accuracy(&validation.labels(), &model.predict(&validation.x)?)?;
        log::info!(
            "Cross-validation fold {}: {} training rows, validation accuracy {:.3}",
            i + 1,
            train.n_samples(),
            fold_accuracy
        );
        fold_accuracies.push(fold_accuracy);
    }

    let last = folds.len() - 1;
    let selected_fold = match selection {
        FoldSelection::LastFold => last,
        FoldSelection::BestValidationAccuracy => {
            let mut best = 0;
            for (i, &acc) in fold_accuracies.iter().enumerate() {
                if acc > fold_accuracies[best] {
                    best = i;
                }
            }
            best
        }
    };

    let train = dataset.select_rows(&folds[selected_fold].train);
    let validation = dataset.select_rows(&folds[selected_fold].validation);
    if selected_fold != last {
        log::info!("Refitting on best fold {}", selected_fold + 1);
        model.fit(&train.x, &train.labels())?;
    }

    Ok(CrossValidation {
        folds,
        fold_accuracies,
        selected_fold,
        train,
        validation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_all_rows() {
        let folds = KFold::new(5, true, 9).split(23).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.validation.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.validation.len(), 23);
            assert!(fold.train.iter().all(|i| !fold.validation.contains(i)));
        }
        let sizes: Vec<usize> = folds.iter().map(|f| f.validation.len()).collect();
        assert_eq!(sizes, vec![5, 5, 5, 4, 4]);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let a = KFold::new(5, true, 9).split(50).unwrap();
        let b = KFold::new(5, true, 9).split(50).unwrap();
        let c = KFold::new(5, true, 10).split(50).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unshuffled_folds_are_contiguous() {
        let folds = KFold::new(2, false, 0).split(4).unwrap();
        assert_eq!(folds[0].validation, vec![0, 1]);
        assert_eq!(folds[1].train, vec![0, 1]);
    }

    #[test]
    fn test_invalid_fold_counts() {
        assert!(KFold::new(1, true, 9).split(10).is_err());
        assert!(KFold::new(6, true, 9).split(5).is_err());
    }

    #[test]
    fn test_fold_selection_from_str() {
        assert_eq!(
            "last-fold".parse::<FoldSelection>(),
            Ok(FoldSelection::LastFold)
        );
        assert_eq!(
            "best-validation".parse::<FoldSelection>(),
            Ok(FoldSelection::BestValidationAccuracy)
        );
        assert!("median".parse::<FoldSelection>().is_err());
    }
}
