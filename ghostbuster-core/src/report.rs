//! Output formatting - plaintext and JSON lines.
//!
//! Findings are written one per line to stdout as they are produced. The
//! per-pass summary goes through tracing, so it lands on stderr.

use serde_json::json;
use std::io::{self, Write};

use crate::builder::RunSummary;
use crate::detect::UnusedFinding;

/// How findings are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `<Category> <identifier> not used`
    #[default]
    Plain,
    /// `{"category":"<Category>","identifier":"<identifier>"}`
    Json,
}

/// Renders a single finding without trailing newline.
pub fn format_finding(format: OutputFormat, finding: &UnusedFinding) -> String {
    match format {
        OutputFormat::Plain => finding.to_string(),
        OutputFormat::Json => json!({
            "category": finding.category.to_string(),
            "identifier": finding.identifier,
        })
        .to_string(),
    }
}

/// Writes a finding line to `out`.
pub fn write_finding(
    out: &mut impl Write,
    format: OutputFormat,
    finding: &UnusedFinding,
) -> io::Result<()> {
    writeln!(out, "{}", format_finding(format, finding))
}

/// Writes a finding line to stdout.
///
/// A closed stdout (e.g. piped into `head`) is logged, not fatal.
pub fn emit(format: OutputFormat, finding: &UnusedFinding) {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    if let Err(e) = write_finding(&mut lock, format, finding) {
        tracing::warn!(error = %e, "could not write finding");
    }
}

/// Logs per-pass counters at info level.
pub fn log_summary(summary: &RunSummary) {
    for report in &summary.reports {
        tracing::info!(
            category = %report.category,
            examined = report.stats.examined,
            unused = report.stats.unused,
            skipped_symlinks = report.stats.skipped_symlinks,
            "pass finished"
        );
    }
    tracing::info!(total_unused = summary.total_unused(), "run finished");
}
