//! Validation report rendering

use std::fmt::Write as _;
use std::path::Path;

use harbor_template::ValidationReport;
use serde::Serialize;

/// Line printed for a template with no findings
pub const SUCCESS_LINE: &str = "Success: Template is valid with no warnings!";

/// Output format for `validate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    /// Parse a `--format` value
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    template: String,
    valid: bool,
    errors: &'a [String],
    warnings: &'a [String],
}

/// Render a report in the requested format
///
/// # Errors
/// Returns error if JSON serialization fails
pub fn render(template: &Path, report: &ValidationReport, format: ReportFormat) -> anyhow::Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(template, report)),
        ReportFormat::Json => render_json(template, report),
    }
}

/// Two-column `Type`/`Message` table
#[must_use]
pub fn render_text(template: &Path, report: &ValidationReport) -> String {
    let name = template
        .file_name()
        .map_or_else(|| template.display().to_string(), |n| n.to_string_lossy().into_owned());

    let mut out = format!("Validation Report: {name}\n");
    if report.is_clean() {
        out.push_str(SUCCESS_LINE);
        out.push('\n');
        return out;
    }

    let rows = report
        .errors()
        .iter()
        .map(|e| ("Error", e))
        .chain(report.warnings().iter().map(|w| ("Warning", w)));

    let _ = writeln!(out, "{:<8} Message", "Type");
    for (kind, message) in rows {
        let _ = writeln!(out, "{kind:<8} {message}");
    }
    out
}

/// JSON object `{template, valid, errors, warnings}`
///
/// # Errors
/// Returns error if serialization fails
pub fn render_json(template: &Path, report: &ValidationReport) -> anyhow::Result<String> {
    let json = JsonReport {
        template: template.display().to_string(),
        valid: report.is_valid(),
        errors: report.errors(),
        warnings: report.warnings(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
