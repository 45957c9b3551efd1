use anyhow::{Context, Result};
use maud::html;
use std::time::Instant;

use dementia_classifiers::io::read_dataset;
use dementia_classifiers::models::classifier_trait::ClassifierModel;
use dementia_classifiers::models::feed_forward::{FeedForwardNet, TrainingHistory};
use dementia_classifiers::preprocessing::Scaler;
use dementia_classifiers::report::plots::{plot_accuracy_history, plot_loss_history};
use dementia_classifiers::report::report::{Report, ReportSection};
use dementia_classifiers::stats::{evaluate, SplitEvaluation};

use crate::classifiers::input::ClassifierRunConfig;
use crate::classifiers::output::{config_section, evaluation_section, print_summary};
use crate::classifiers::util::write_plot;

/// Results of a feed-forward network run.
pub struct NeuralRun {
    pub history: TrainingHistory,
    /// Full training set, validation tail (when non-empty) and test set.
    pub evaluations: Vec<SplitEvaluation>,
}

/// Train the feed-forward network on the training table, holding out its
/// last rows for early stopping, then score it on the training, validation
/// and test rows.
pub fn run_neural(config: &ClassifierRunConfig) -> Result<NeuralRun> {
    let mut model = FeedForwardNet::new(config.model.clone())?;
    let start_time = Instant::now();

    let dataset_config = config.dataset_config();
    let mut train = read_dataset(&config.train_data, &dataset_config)?;
    let mut test = read_dataset(&config.test_data, &dataset_config)?
        .align_to(&train.feature_names)
        .with_context(|| format!("Test data {} does not match the training columns", config.test_data))?;
    train.log_summary("train");
    test.log_summary("test");

    let validation_start = model.validation_start(train.n_samples());
    if config.scale_features {
        let (fit_rows, _) = train.split_at(validation_start);
        let scaler = Scaler::fit(&fit_rows.x)?;
        train.x = scaler.transform(&train.x)?;
        test.x = scaler.transform(&test.x)?;
        log::info!("Standardised {} features", train.n_features());
    }

    model
        .fit(&train.x, &train.labels())
        .context("Training the feed-forward network failed")?;
    let history = model
        .history()
        .cloned()
        .context("Fitted network has no training history")?;
    log::info!(
        "Training completed in {:?} after {} epochs",
        start_time.elapsed(),
        history.epochs()
    );

    let (_, validation) = train.split_at(validation_start);
    let mut evaluations = vec![evaluate(&model, &train, "train")?];
    if !validation.is_empty() {
        evaluations.push(evaluate(&model, &validation, "validation")?);
    }
    evaluations.push(evaluate(&model, &test, "test")?);

    println!("accuracy: {:.2}%", evaluations[0].accuracy * 100.0);
    if let Some(val_accuracy) = history.last_val_accuracy() {
        println!("val_accuracy: {:.4}", val_accuracy);
    }
    print_summary(&evaluations);

    let mut plots = Vec::new();
    if config.plot_history {
        let accuracy_plot = plot_accuracy_history(&history);
        write_plot(&accuracy_plot, &config.plot_dir, "model_accuracy.html")?;
        let loss_plot = plot_loss_history(&history);
        write_plot(&loss_plot, &config.plot_dir, "model_loss.html")?;
        plots.push(accuracy_plot);
        plots.push(loss_plot);
    }

    let run = NeuralRun {
        history,
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
    run: &NeuralRun,
    plots: Vec<plotly::Plot>,
) -> Result<Report> {
    let mut report = Report::new(
        "dementia",
        &config.version,
        None,
        "Feed-forward Network Report",
    );

    report.add_section(evaluation_section(
        "Metrics of the trained network on the full training set, its held-out validation tail and the test set.",
        &run.evaluations,
    ));

    let history = &run.history;
    let mut training_section = ReportSection::new("Training");
    training_section.add_content(html! {
        p {
            "Trained for " (history.epochs()) " epochs"
            @if let Some(stopped) = history.stopped_epoch {
                ", stopped early at epoch " (stopped + 1)
            }
            @if let Some(best) = history.best_epoch {
                "; lowest validation loss at epoch " (best + 1)
            }
            "."
        }
    });
    for plot in plots {
        training_section.add_plot(plot);
    }
    report.add_section(training_section);

    report.add_section(config_section(config)?);
    Ok(report)
}
