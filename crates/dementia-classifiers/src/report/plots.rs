use plotly::common::Mode;
use plotly::layout::{Axis, Layout};
use plotly::{HeatMap, Histogram, Plot, Scatter};
use rayon::prelude::*;
use statrs::statistics::Statistics;

use crate::data_handling::Dataset;
use crate::error::ClassifierError;
use crate::models::feed_forward::TrainingHistory;

/// Pearson correlation between every pair of feature columns.
///
/// A constant column has no defined correlation; its cells are NaN.
pub fn correlation_matrix(dataset: &Dataset) -> Vec<Vec<f64>> {
    let columns: Vec<Vec<f64>> = (0..dataset.n_features())
        .map(|c| dataset.x.column(c).iter().map(|&v| v as f64).collect())
        .collect();
    let std_devs: Vec<f64> = columns
        .iter()
        .map(|col| col.iter().population_std_dev())
        .collect();

    columns
        .par_iter()
        .enumerate()
        .map(|(i, a)| {
            columns
                .iter()
                .enumerate()
                .map(|(j, b)| {
                    let cov = a.iter().population_covariance(b.iter());
                    cov / (std_devs[i] * std_devs[j])
                })
                .collect()
        })
        .collect()
}

/// Heatmap of the feature correlation matrix.
pub fn plot_correlation(dataset: &Dataset) -> Result<Plot, ClassifierError> {
    if dataset.is_empty() {
        return Err(ClassifierError::EmptyDataset);
    }
    let labels = dataset.feature_names.clone();
    let trace = HeatMap::new(labels.clone(), labels, correlation_matrix(dataset))
        .name("Pearson correlation");

    let layout = Layout::new()
        .title("Features correlation")
        .height(800)
        .width(900);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    Ok(plot)
}

/// Frequency histogram of one feature.
pub fn plot_frequency(dataset: &Dataset, feature: &str) -> Result<Plot, ClassifierError> {
    let values = dataset.feature_column(feature)?;

    let trace = Histogram::new(values).name(feature);
    let layout = Layout::new()
        .title("Frequency Histogram")
        .x_axis(Axis::new().title(feature))
        .y_axis(Axis::new().title("Frequency"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    Ok(plot)
}

fn history_plot(train: &[f32], validation: &[f32], title: &str, y_title: &str) -> Plot {
    let epochs: Vec<usize> = (1..=train.len()).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(epochs.clone(), train.to_vec())
            .mode(Mode::Lines)
            .name("train"),
    );
    if !validation.is_empty() {
        plot.add_trace(
            Scatter::new(epochs, validation.to_vec())
                .mode(Mode::Lines)
                .name("validation"),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("epoch"))
            .y_axis(Axis::new().title(y_title)),
    );
    plot
}

/// Accuracy per epoch for the training and validation portions.
pub fn plot_accuracy_history(history: &TrainingHistory) -> Plot {
    history_plot(
        &history.accuracy,
        &history.val_accuracy,
        "model accuracy",
        "accuracy",
    )
}

/// Loss per epoch for the training and validation portions.
pub fn plot_loss_history(history: &TrainingHistory) -> Plot {
    history_plot(&history.loss, &history.val_loss, "model loss", "loss")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn dataset() -> Dataset {
        let x = Array2::from_shape_vec(
            (4, 3),
            vec![
                1.0, 2.0, 5.0, //
                2.0, 4.0, 5.0, //
                3.0, 6.0, 5.0, //
                4.0, 8.0, 5.0,
            ],
        )
        .unwrap();
        Dataset::new(
            x,
            Array1::from_vec(vec![0, 1, 0, 1]),
            vec!["hesitations".into(), "words".into(), "constant".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_correlation_of_linear_columns() {
        let corr = correlation_matrix(&dataset());
        assert!((corr[0][1] - 1.0).abs() < 1e-9);
        assert!((corr[1][1] - 1.0).abs() < 1e-9);
        assert!(corr[0][2].is_nan());
    }

    #[test]
    fn test_frequency_plot_requires_known_feature() {
        assert!(plot_frequency(&dataset(), "hesitations").is_ok());
        assert!(matches!(
            plot_frequency(&dataset(), "pauses"),
            Err(ClassifierError::MissingColumn(_))
        ));
    }
}
