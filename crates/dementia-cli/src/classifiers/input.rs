use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use dementia_classifiers::config::{CrossValidationConfig, DatasetConfig, ModelConfig, ModelType};
use dementia_classifiers::cross_validation::FoldSelection;

use crate::classifiers::util::validate_tsv_or_csv_file;

/// Settings shared by the `naive-bayes` and `neural` pipelines.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierRunConfig {
    pub version: String,
    pub train_data: String,
    pub test_data: String,
    pub delimiter: char,
    pub label_column: String,
    pub positive_label: String,
    pub negative_label: String,
    pub drop_columns: Vec<String>,
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
    pub fold_selection: FoldSelection,
    pub model: ModelConfig,
    pub scale_features: bool,
    pub plot_correlation: bool,
    pub plot_frequency: Option<String>,
    pub plot_history: bool,
    pub plot_dir: String,
    pub report_file: Option<String>,
}

impl Default for ClassifierRunConfig {
    fn default() -> Self {
        let dataset = DatasetConfig::default();
        let cv = CrossValidationConfig::default();
        ClassifierRunConfig {
            version: clap::crate_version!().to_string(),
            train_data: String::from("train_set.csv"),
            test_data: String::from("test_set.csv"),
            delimiter: dataset.delimiter,
            label_column: dataset.label_column,
            positive_label: dataset.positive_label,
            negative_label: dataset.negative_label,
            drop_columns: dataset.drop_columns,
            n_splits: cv.n_splits,
            shuffle: cv.shuffle,
            seed: cv.seed,
            fold_selection: cv.fold_selection,
            model: ModelConfig::default(),
            scale_features: false,
            plot_correlation: false,
            plot_frequency: None,
            plot_history: false,
            plot_dir: String::from("plots"),
            report_file: None,
        }
    }
}

impl ClassifierRunConfig {
    /// Defaults for a pipeline whose model is `model_type`.
    pub fn with_model(model_type: ModelType) -> Self {
        let mut config = ClassifierRunConfig::default();
        config.model = ModelConfig::new(config.seed, model_type);
        config
    }

    /// Build the run configuration from an optional JSON file plus CLI overrides.
    ///
    /// Fields missing from the file, or holding values of the wrong type, keep
    /// their defaults with a warning.
    pub fn from_arguments(
        config_path: Option<&PathBuf>,
        matches: &ArgMatches,
        default_model: ModelType,
    ) -> Result<Self> {
        let mut config = ClassifierRunConfig::with_model(default_model);

        if let Some(config_path) = config_path {
            let config_json = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let partial: serde_json::Value = serde_json::from_str(&config_json)
                .with_context(|| format!("Config file is not valid JSON: {:?}", config_path))?;

            macro_rules! load_or_default {
                ($field:ident) => {
                    if let Some(val) = partial.get(stringify!($field)) {
                        if let Ok(parsed) = serde_json::from_value(val.clone()) {
                            config.$field = parsed;
                        } else {
                            log::warn!(
                                "Config Invalid value for '{}', using default: {:?}",
                                stringify!($field),
                                config.$field
                            );
                        }
                    } else {
                        log::warn!(
                            "Config Missing field '{}', using default: {:?}",
                            stringify!($field),
                            config.$field
                        );
                    }
                };
            }

            load_or_default!(train_data);
            load_or_default!(test_data);
            load_or_default!(delimiter);
            load_or_default!(label_column);
            load_or_default!(positive_label);
            load_or_default!(negative_label);
            load_or_default!(drop_columns);
            load_or_default!(n_splits);
            load_or_default!(shuffle);
            load_or_default!(seed);
            load_or_default!(fold_selection);
            load_or_default!(model);
            load_or_default!(scale_features);
            load_or_default!(plot_correlation);
            load_or_default!(plot_frequency);
            load_or_default!(plot_history);
            load_or_default!(plot_dir);
            load_or_default!(report_file);
        }

        // Apply CLI overrides
        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        if let Some(test_data) = matches.get_one::<String>("test_data") {
            config.test_data = test_data.clone();
        }

        if let Some(report_file) = matches.get_one::<String>("report") {
            config.report_file = Some(report_file.clone());
        }
        if let Some(plot_dir) = matches.get_one::<String>("plot_dir") {
            config.plot_dir = plot_dir.clone();
        }

        // Subcommand-specific flags; absent ids are skipped.
        if let Ok(Some(selection)) = matches.try_get_one::<String>("fold_selection") {
            config.fold_selection = FoldSelection::from_str(selection).map_err(anyhow::Error::msg)?;
        }
        if let Ok(Some(true)) = matches.try_get_one::<bool>("plot_correlation") {
            config.plot_correlation = true;
        }
        if let Ok(Some(feature)) = matches.try_get_one::<String>("plot_frequency") {
            config.plot_frequency = Some(feature.clone());
        }
        if let Ok(Some(true)) = matches.try_get_one::<bool>("plot_history") {
            config.plot_history = true;
        }
        if let Ok(Some(true)) = matches.try_get_one::<bool>("scale_features") {
            config.scale_features = true;
        }

        if let ModelType::FeedForward {
            max_epochs,
            early_stopping_patience,
            ..
        } = &mut config.model.model_type
        {
            if let Ok(Some(epochs)) = matches.try_get_one::<usize>("epochs") {
                *max_epochs = *epochs;
            }
            if let Ok(Some(patience)) = matches.try_get_one::<usize>("patience") {
                *early_stopping_patience = *patience;
            }
        }

        Ok(config)
    }

    /// Both data files must exist with a `.csv` or `.tsv` extension.
    pub fn validate_data_files(&self) -> Result<()> {
        validate_tsv_or_csv_file(&self.train_data)?;
        validate_tsv_or_csv_file(&self.test_data)
    }

    pub fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig {
            delimiter: self.delimiter,
            label_column: self.label_column.clone(),
            positive_label: self.positive_label.clone(),
            negative_label: self.negative_label.clone(),
            drop_columns: self.drop_columns.clone(),
        }
    }

    pub fn cross_validation_config(&self) -> CrossValidationConfig {
        CrossValidationConfig {
            n_splits: self.n_splits,
            shuffle: self.shuffle,
            seed: self.seed,
            fold_selection: self.fold_selection,
        }
    }
}
