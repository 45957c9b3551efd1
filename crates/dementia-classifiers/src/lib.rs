//! dementia-classifiers: binary classifiers for dementia detection from
//! per-transcript speech features.
//!
//! The crate loads delimited feature tables, fits a Gaussian Naive Bayes model
//! under seeded k-fold cross-validation or a small feed-forward network with
//! early stopping, and scores fitted models by accuracy, sensitivity and
//! specificity. Plotting and HTML reporting helpers live under [`report`].
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod stats;
