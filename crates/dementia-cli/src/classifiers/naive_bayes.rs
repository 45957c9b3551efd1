use anyhow::{Context, Result};
use maud::html;
use std::time::Instant;

use dementia_classifiers::config::ModelType;
use dementia_classifiers::cross_validation::{cross_validate, CrossValidation, KFold};
use dementia_classifiers::io::read_dataset;
use dementia_classifiers::models::factory::build_model;
use dementia_classifiers::report::plots::{plot_correlation, plot_frequency};
use dementia_classifiers::report::report::{Report, ReportSection};
use dementia_classifiers::stats::{evaluate, SplitEvaluation};

use crate::classifiers::input::ClassifierRunConfig;
use crate::classifiers::output::{config_section, evaluation_section, print_summary};
use crate::classifiers::util::write_plot;

/// Results of a cross-validated Naive Bayes run.
pub struct NaiveBayesRun {
    pub cross_validation: CrossValidation,
    /// Train, validation and test evaluations, in that order.
    pub evaluations: Vec<SplitEvaluation>,
}

/// Load the train and test tables, cross-validate a Gaussian Naive Bayes model
/// and score the selected fold's fit on its train and validation rows and on
/// the test set.
pub fn run_naive_bayes(config: &ClassifierRunConfig) -> Result<NaiveBayesRun> {
    if !matches!(config.model.model_type, ModelType::GaussianNb { .. }) {
        anyhow::bail!(
            "naive-bayes expects a gaussian_nb model, config has {}",
            config.model.model_type.name()
        );
    }
    let start_time = Instant::now();

    let dataset_config = config.dataset_config();
    let train = read_dataset(&config.train_data, &dataset_config)?;
    let test = read_dataset(&config.test_data, &dataset_config)?
        .align_to(&train.feature_names)
        .with_context(|| format!("Test data {} does not match the training columns", config.test_data))?;
    train.log_summary("train");
    test.log_summary("test");

    let mut plots = Vec::new();
    if config.plot_correlation {
        let plot = plot_correlation(&train)?;
        write_plot(&plot, &config.plot_dir, "correlation_heatmap.html")?;
        plots.push(plot);
    }
    if let Some(feature) = &config.plot_frequency {
        let plot = plot_frequency(&train, feature)
            .with_context(|| format!("Cannot plot frequency of '{}'", feature))?;
        write_plot(&plot, &config.plot_dir, &format!("frequency_{}.html", feature))?;
        plots.push(plot);
    }

    let cv = config.cross_validation_config();
    let kfold = KFold::new(cv.n_splits, cv.shuffle, cv.seed);
    let mut model = build_model(config.model.clone())?;
    let cross_validation = cross_validate(model.as_mut(), &train, &kfold, cv.fold_selection)
        .context("Cross-validation failed")?;
    log::info!(
        "Cross-validation finished in {:?}: mean validation accuracy {:.3}, using fold {}",
        start_time.elapsed(),
        cross_validation.mean_accuracy(),
        cross_validation.selected_fold + 1
    );

    let evaluations = vec![
        evaluate(model.as_ref(), &cross_validation.train, "train")?,
        evaluate(model.as_ref(), &cross_validation.validation, "validation")?,
        evaluate(model.as_ref(), &test, "test")?,
    ];
    print_summary(&evaluations);

    let run = NaiveBayesRun {
        cross_validation,
        evaluations,
    };

    if let Some(report_file) = &config.report_file {
        let report = build_report(config, &run, plots)?;
        report.save_to_file(report_file)?;
    }

    Ok(run)
}

fn build_report(
    config: &ClassifierRunConfig,
    run: &NaiveBayesRun,
    plots: Vec<plotly::Plot>,
) -> Result<Report> {
    let mut report = Report::new(
        "dementia",
        &config.version,
        None,
        "Gaussian Naive Bayes Report",
    );

    report.add_section(evaluation_section(
        "Metrics of the selected cross-validation fold on its training and held-out rows, and on the test set.",
        &run.evaluations,
    ));

    let cv = &run.cross_validation;
    let mut cv_section = ReportSection::new("Cross-validation");
    cv_section.add_content(html! {
        p {
            (cv.folds.len()) " folds, mean validation accuracy "
            (format!("{:.2}%", cv.mean_accuracy() * 100.0))
            ". Reported metrics use fold " (cv.selected_fold + 1) "."
        }
        table {
            thead { tr { th { "fold" } th { "train rows" } th { "validation rows" } th { "validation accuracy" } } }
            tbody {
                @for (i, fold) in cv.folds.iter().enumerate() {
                    tr {
                        td { (i + 1) }
                        td { (fold.train.len()) }
                        td { (fold.validation.len()) }
                        td { (format!("{:.2}%", cv.fold_accuracies[i] * 100.0)) }
                    }
                }
            }
        }
    });
    report.add_section(cv_section);

    if !plots.is_empty() {
        let mut plot_section = ReportSection::new("Feature plots");
        for plot in plots {
            plot_section.add_plot(plot);
        }
        report.add_section(plot_section);
    }

    report.add_section(config_section(config)?);
    Ok(report)
}
