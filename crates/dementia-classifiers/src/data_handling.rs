//! Data structures and helpers for turning raw tables into labelled datasets.
//!
//! This module defines `Table` (raw header + string cells) and `Dataset`
//! (numeric feature matrix + binary labels), the column-dropping and
//! label-mapping step, and row selection used to build cross-validation folds.
use ndarray::{Array1, Array2, Axis};

use crate::config::DatasetConfig;
use crate::error::ClassifierError;

/// A delimited file as read from disk: header names and raw string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn ncols(&self) -> usize {
        self.headers.len()
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, ClassifierError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| ClassifierError::MissingColumn(name.to_string()))
    }

    /// Return a copy of the table without the named columns.
    ///
    /// Every name must be present; the first missing one is reported.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, ClassifierError> {
        let mut dropped = Vec::with_capacity(names.len());
        for name in names {
            dropped.push(self.column_index(name.as_ref())?);
        }

        let keep: Vec<usize> = (0..self.ncols()).filter(|i| !dropped.contains(i)).collect();

        Ok(Table {
            headers: keep.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }
}

/// Numeric features with binary labels (1 = dementia, 0 = control).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Array2<f32>,
    pub y: Array1<i32>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    pub fn new(
        x: Array2<f32>,
        y: Array1<i32>,
        feature_names: Vec<String>,
    ) -> Result<Self, ClassifierError> {
        if x.nrows() != y.len() {
            return Err(ClassifierError::LengthMismatch {
                expected: x.nrows(),
                found: y.len(),
            });
        }
        if x.ncols() != feature_names.len() {
            return Err(ClassifierError::FeatureMismatch {
                expected: feature_names.len(),
                found: x.ncols(),
            });
        }
        if let Some(row) = y.iter().position(|&label| label != 0 && label != 1) {
            return Err(ClassifierError::UnknownLabel {
                row: row + 1,
                value: y[row].to_string(),
            });
        }
        Ok(Dataset {
            x,
            y,
            feature_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }

    pub fn labels(&self) -> Vec<i32> {
        self.y.to_vec()
    }

    /// Number of (control, dementia) rows.
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.y.iter().filter(|&&v| v == 1).count();
        (self.y.len() - positives, positives)
    }

    /// Values of one feature column, looked up by name.
    pub fn feature_column(&self, name: &str) -> Result<Vec<f64>, ClassifierError> {
        let idx = self
            .feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ClassifierError::MissingColumn(name.to_string()))?;
        Ok(self.x.column(idx).iter().map(|&v| v as f64).collect())
    }

    /// A new dataset holding only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Reorder the feature columns to match `feature_names`.
    ///
    /// A dataset read from another file may list the same columns in a different
    /// order. Every expected name must be present and no other column may be.
    pub fn align_to(&self, feature_names: &[String]) -> Result<Dataset, ClassifierError> {
        let mut indices = Vec::with_capacity(feature_names.len());
        for name in feature_names {
            let idx = self
                .feature_names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ClassifierError::MissingColumn(name.clone()))?;
            indices.push(idx);
        }
        if self.n_features() != feature_names.len() {
            return Err(ClassifierError::FeatureMismatch {
                expected: feature_names.len(),
                found: self.n_features(),
            });
        }
        if indices.iter().enumerate().any(|(i, &idx)| i != idx) {
            log::warn!("Reordering feature columns to match the training set");
        }

        Ok(Dataset {
            x: self.x.select(Axis(1), &indices),
            y: self.y.clone(),
            feature_names: feature_names.to_vec(),
        })
    }

    /// Split into the rows before and from `at` onwards.
    pub fn split_at(&self, at: usize) -> (Dataset, Dataset) {
        let at = at.min(self.n_samples());
        let head: Vec<usize> = (0..at).collect();
        let tail: Vec<usize> = (at..self.n_samples()).collect();
        (self.select_rows(&head), self.select_rows(&tail))
    }

    pub fn log_summary(&self, name: &str) {
        let (controls, dementia) = self.class_counts();
        log::info!(
            "{} set: {} rows ({} dementia, {} control), {} feature columns",
            name,
            self.n_samples(),
            dementia,
            controls,
            self.n_features()
        );
    }
}

/// Separate the label column from the features.
///
/// Drops the label column and the configured missing-value columns, parses the
/// remaining cells as numbers and maps the label values to {0, 1}. A table with
/// N columns yields `N - 1 - drop_columns.len()` feature columns.
pub fn split_features_labels(
    table: &Table,
    config: &DatasetConfig,
) -> Result<Dataset, ClassifierError> {
    if table.nrows() == 0 {
        return Err(ClassifierError::EmptyDataset);
    }

    let label_idx = table.column_index(&config.label_column)?;
    let labels = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| map_label(&row[label_idx], row_idx + 1, config))
        .collect::<Result<Vec<i32>, _>>()?;

    let mut to_drop: Vec<&str> = vec![config.label_column.as_str()];
    to_drop.extend(config.drop_columns.iter().map(|s| s.as_str()));
    let features = table.drop_columns(&to_drop)?;

    let n_samples = features.nrows();
    let n_features = features.ncols();
    let mut values = Vec::with_capacity(n_samples * n_features);
    for (row_idx, row) in features.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let parsed = cell
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ClassifierError::InvalidValue {
                    row: row_idx + 1,
                    column: features.headers[col_idx].clone(),
                    value: cell.clone(),
                })?;
            values.push(parsed);
        }
    }

    let x = Array2::from_shape_vec((n_samples, n_features), values)?;
    Dataset::new(x, Array1::from_vec(labels), features.headers)
}

fn map_label(value: &str, row: usize, config: &DatasetConfig) -> Result<i32, ClassifierError> {
    if value == config.positive_label {
        Ok(1)
    } else if value == config.negative_label {
        Ok(0)
    } else {
        Err(ClassifierError::UnknownLabel {
            row,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table {
            headers: vec!["a", "pauses", "b", "dementia", "retracing_reform"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows: vec![
                vec!["1.0", "", "2", "Y", ""],
                vec!["0.5", "3", "4", "N", "1"],
            ]
            .into_iter()
            .map(|r| r.into_iter().map(String::from).collect())
            .collect(),
        }
    }

    #[test]
    fn test_split_drops_label_and_missing_value_columns() {
        let dataset = split_features_labels(&table(), &DatasetConfig::default()).unwrap();
        assert_eq!(dataset.n_features(), table().ncols() - 3);
        assert_eq!(dataset.feature_names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(dataset.labels(), vec![1, 0]);
        assert_eq!(dataset.x[(1, 1)], 4.0);
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let mut t = table();
        t.rows[1][3] = "maybe".to_string();
        let err = split_features_labels(&t, &DatasetConfig::default()).unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownLabel { row: 2, .. }));
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let dataset = split_features_labels(&table(), &DatasetConfig::default()).unwrap();
        let picked = dataset.select_rows(&[1, 0]);
        assert_eq!(picked.labels(), vec![0, 1]);
        assert_eq!(picked.x[(0, 0)], 0.5);
    }

    #[test]
    fn test_align_to_rejects_extra_column() {
        let dataset = split_features_labels(&table(), &DatasetConfig::default()).unwrap();
        let err = dataset.align_to(&["b".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::FeatureMismatch {
                expected: 1,
                found: 2
            }
        ));
    }
}
