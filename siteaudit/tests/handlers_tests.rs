// Tests for CLI handler helpers

use siteaudit::handlers::{render_report, resolve_output_path, summary_line};
use siteaudit::{Report, ReportFormat};
use siteaudit_core::report::ReportBuilder;
use siteaudit_scanner::result::{Finding, PageRecord, Severity};

fn small_report() -> Report {
    let mut builder = ReportBuilder::new("https://example.com", 1);
    let mut page = PageRecord::new("https://example.com".to_string(), 0);
    page.findings.push(Finding::new(
        "H1Check",
        Severity::Warning,
        "page has no h1 heading",
    ));
    builder.record(page);
    builder.record(PageRecord::with_error(
        "https://example.com/broken".to_string(),
        1,
        "timed out".to_string(),
    ));
    builder.finalize()
}

#[test]
fn test_resolve_output_path_passes_plain_paths_through() {
    let path = resolve_output_path("reports/site.json");
    assert_eq!(path.to_str().unwrap(), "reports/site.json");
}

#[test]
fn test_resolve_output_path_expands_tilde() {
    let path = resolve_output_path("~/site.json");
    assert!(!path.to_str().unwrap().starts_with('~'));
    assert!(path.to_str().unwrap().ends_with("site.json"));
}

#[test]
fn test_render_report_text() {
    let report = small_report();
    let text = render_report(&report, &ReportFormat::Text).unwrap();
    assert!(text.contains("SITE AUDIT REPORT"));
    assert!(text.contains("H1Check"));
}

#[test]
fn test_render_report_json_is_parseable() {
    let report = small_report();
    let json = render_report(&report, &ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["seedUrl"], "https://example.com");
    assert_eq!(value["pages"][1]["fetchStatus"], "fetchFailed");
}

#[test]
fn test_summary_line_counts_failures_and_findings() {
    let report = small_report();
    let line = summary_line(&report);
    assert_eq!(line, "2 pages audited (1 failed), 1 findings");
}
