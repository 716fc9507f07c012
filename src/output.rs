use std::fmt::Write as _;

use probe_engine::{ProbeReport, SuiteReport};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Human => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

pub fn render_suite(report: &SuiteReport, format: OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|err| AppError::Render(err.to_string()))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|err| AppError::Render(err.to_string()))
        }
        OutputFormat::Human => Ok(render_human(report)),
    }
}

fn render_human(report: &SuiteReport) -> String {
    let mut out = String::new();
    for entry in &report.results {
        let _ = writeln!(out, "{}", human_line(entry));
    }
    let summary = &report.summary;
    let average = summary
        .average_score
        .map(|score| format!("{score:.1}"))
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "\n{} probe(s), {} found, {}/{} interaction(s) succeeded, average score {}, {}ms",
        summary.total,
        summary.found,
        summary.interactions_succeeded,
        summary.interactions_attempted,
        average,
        summary.execution_time_ms
    );
    out
}

fn human_line(entry: &ProbeReport) -> String {
    let result = &entry.result;
    let label = match &entry.description {
        Some(description) => format!("{} ({})", entry.selector, description),
        None => entry.selector.clone(),
    };
    if !result.found {
        return format!("[missing] {label}");
    }

    let mut line = format!("[found]   {label}");
    if let Some(details) = &result.details {
        let name = details.accessible_name.as_deref().unwrap_or("<no name>");
        let _ = write!(line, " <{}> \"{}\"", details.tag_name, name);
    }
    if result.child_found {
        if let Some(child) = &result.child_details {
            let _ = write!(line, " child=<{}>", child.tag_name);
        }
    }
    if let Some(outcome) = &result.interaction_result {
        if outcome.success {
            let _ = write!(line, " {}=ok score={}", outcome.kind, outcome.accessibility_score);
        } else {
            let _ = write!(
                line,
                " {}=failed ({})",
                outcome.kind,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    if let Some(changes) = &result.dom_changes {
        if !changes.description.is_empty() {
            let _ = write!(line, " [{}]", changes.description);
        }
    }
    let _ = write!(line, " {}ms", result.execution_time_ms);
    line
}
