use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::stats::SplitEvaluation;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// A titled block of HTML content and plots.
pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
    plots: Vec<Plot>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            content: Vec::new(),
            plots: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.plots.push(plot);
    }

    fn render(&self, index: usize) -> Markup {
        html! {
            section class="report-section" {
                h2 { (self.title) }
                @for block in &self.content {
                    div.content { (block) }
                }
                @for (j, plot) in self.plots.iter().enumerate() {
                    div.plot {
                        (PreEscaped(plot.to_inline_html(Some(&format!("plot-{}-{}", index, j)))))
                    }
                }
            }
        }
    }
}

/// Self-contained HTML report.
pub struct Report {
    software: String,
    version: String,
    logo: Option<String>,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(software: &str, version: &str, logo: Option<&str>, title: &str) -> Self {
        Report {
            software: software.to_string(),
            version: version.to_string(),
            logo: logo.map(str::to_string),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> String {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let page = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; }
                         table { border-collapse: collapse; }
                         th, td { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
                         th:first-child, td:first-child { text-align: left; }"
                    }
                }
                body {
                    header {
                        @if let Some(logo) = &self.logo {
                            img src=(logo) alt=(self.software) height="60";
                        }
                        h1 { (self.title) }
                        p { (self.software) " v" (self.version) " | generated " (generated) }
                    }
                    @for (i, section) in self.sections.iter().enumerate() {
                        (section.render(i))
                    }
                }
            }
        };
        page.into_string()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "undefined".to_string(),
    }
}

/// Metrics table with one row per evaluated split.
pub fn evaluation_table(evaluations: &[SplitEvaluation]) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { "split" }
                    th { "samples" }
                    th { "accuracy" }
                    th { "sensitivity" }
                    th { "specificity" }
                    th { "TN" } th { "FP" } th { "FN" } th { "TP" }
                }
            }
            tbody {
                @for e in evaluations {
                    tr {
                        td { (e.split) }
                        td { (e.n_samples) }
                        td { (percent(Some(e.accuracy))) }
                        td { (percent(e.sensitivity)) }
                        td { (percent(e.specificity)) }
                        td { (e.confusion.tn) }
                        td { (e.confusion.fp) }
                        td { (e.confusion.fn_) }
                        td { (e.confusion.tp) }
                    }
                }
            }
        }
    }
}

/// Pretty-printed JSON block, used for configuration dumps.
pub fn code_block(text: &str) -> Markup {
    html! {
        pre style="background-color: #f5f5f5; padding: 10px; border-radius: 5px; overflow-x: auto;" {
            code { (text) }
        }
    }
}
