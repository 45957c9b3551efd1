//! Console lines for split evaluations.

use crate::stats::SplitEvaluation;

const LABEL_WIDTH: usize = 35;

fn capitalize(split: &str) -> String {
    let mut chars = split.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"Accuracy on <split> set:"` padded to 35 columns, percentage with three decimals.
pub fn accuracy_line(evaluation: &SplitEvaluation) -> String {
    let label = format!("Accuracy on {} set:", evaluation.split);
    format!(
        "{:<width$} {:6.3}%",
        label,
        evaluation.accuracy * 100.0,
        width = LABEL_WIDTH
    )
}

fn rate_line(metric: &str, split: &str, value: Option<f64>) -> String {
    let label = format!("{} on {} set:", metric, split);
    match value {
        Some(v) => format!("{:<width$} {:6.2}%", label, v * 100.0, width = LABEL_WIDTH),
        None => format!("{:<width$} undefined", label, width = LABEL_WIDTH),
    }
}

pub fn specificity_line(evaluation: &SplitEvaluation) -> String {
    rate_line("Specificity", &evaluation.split, evaluation.specificity)
}

pub fn sensitivity_line(evaluation: &SplitEvaluation) -> String {
    rate_line("Sensitivity", &evaluation.split, evaluation.sensitivity)
}

/// All accuracy lines first, then specificity and sensitivity per split.
pub fn summary_lines(evaluations: &[SplitEvaluation]) -> Vec<String> {
    let mut lines: Vec<String> = evaluations.iter().map(accuracy_line).collect();
    for evaluation in evaluations {
        lines.push(specificity_line(evaluation));
        lines.push(sensitivity_line(evaluation));
    }
    lines
}

/// Title-cased split name, e.g. for report headings.
pub fn split_title(split: &str) -> String {
    format!("{} set", capitalize(split))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ConfusionCounts;

    fn evaluation(split: &str, sensitivity: Option<f64>) -> SplitEvaluation {
        SplitEvaluation {
            split: split.to_string(),
            n_samples: 8,
            accuracy: 0.75,
            confusion: ConfusionCounts {
                tn: 3,
                fp: 1,
                fn_: 1,
                tp: 3,
            },
            sensitivity,
            specificity: Some(0.75),
        }
    }

    #[test]
    fn test_line_formats() {
        let e = evaluation("test", Some(0.75));
        assert_eq!(
            accuracy_line(&e),
            format!("{:<35} {}", "Accuracy on test set:", "75.000%")
        );
        assert_eq!(
            specificity_line(&e),
            format!("{:<35} {}", "Specificity on test set:", " 75.00%")
        );
    }

    #[test]
    fn test_undefined_rate_is_not_zero() {
        let line = sensitivity_line(&evaluation("validation", None));
        assert!(line.ends_with("undefined"));
        assert!(!line.contains("0.00%"));
    }

    #[test]
    fn test_summary_order() {
        let lines = summary_lines(&[evaluation("train", Some(1.0)), evaluation("test", None)]);
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Accuracy on train set:"));
        assert!(lines[1].starts_with("Accuracy on test set:"));
        assert!(lines[2].starts_with("Specificity on train set:"));
        assert!(lines[5].starts_with("Sensitivity on test set:"));
        assert_eq!(split_title("validation"), "Validation set");
    }
}
