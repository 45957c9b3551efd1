use anyhow::Result;
use maud::html;

use dementia_classifiers::report::report::{code_block, evaluation_table, ReportSection};
use dementia_classifiers::report::summary::summary_lines;
use dementia_classifiers::stats::SplitEvaluation;

use crate::classifiers::input::ClassifierRunConfig;

/// Print the accuracy, specificity and sensitivity lines to stdout.
pub fn print_summary(evaluations: &[SplitEvaluation]) {
    for line in summary_lines(evaluations) {
        println!("{}", line);
    }
}

pub fn evaluation_section(description: &str, evaluations: &[SplitEvaluation]) -> ReportSection {
    let mut section = ReportSection::new("Evaluation");
    section.add_content(html! {
        p { (description) }
        (evaluation_table(evaluations))
    });
    section
}

pub fn config_section(config: &ClassifierRunConfig) -> Result<ReportSection> {
    let mut section = ReportSection::new("Configuration");
    section.add_content(code_block(&serde_json::to_string_pretty(config)?));
    Ok(section)
}
