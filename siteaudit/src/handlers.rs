use siteaudit_core::report::{Report, ReportFormat, generate_json_report, generate_text_report};
use std::path::PathBuf;

/// Expand `~` in a user-supplied output path.
pub fn resolve_output_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Render a finalized report in the requested format.
pub fn render_report(report: &Report, format: &ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Json => {
            generate_json_report(report).map_err(|e| format!("failed to serialize report: {}", e))
        }
    }
}

/// One-line outcome shown after the run, regardless of where the report went.
pub fn summary_line(report: &Report) -> String {
    let failed = report
        .summary
        .pages_by_status
        .get("fetchFailed")
        .copied()
        .unwrap_or(0);
    let findings: usize = report.summary.findings_by_severity.values().sum();
    format!(
        "{} pages audited ({} failed), {} findings",
        report.summary.total_pages, failed, findings
    )
}
