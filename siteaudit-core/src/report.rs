// Report assembly and rendering

use serde::{Deserialize, Serialize};
use siteaudit_scanner::result::PageRecord;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Aggregate counts over the whole run. Map keys are sorted so serialization
/// is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_pages: usize,
    pub pages_by_status: BTreeMap<String, usize>,
    pub findings_by_severity: BTreeMap<String, usize>,
    pub findings_by_rule: BTreeMap<String, usize>,
}

/// The one artifact that outlives a run. Field names are the downstream
/// compatibility surface; do not rename them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub seed_url: String,
    pub max_depth: usize,
    pub pages: Vec<PageRecord>,
    pub summary: Summary,
}

/// Collects page records in arrival order. `finalize` consumes the builder,
/// so a frozen report can never gain or lose pages afterwards.
pub struct ReportBuilder {
    seed_url: String,
    max_depth: usize,
    pages: Vec<PageRecord>,
}

impl ReportBuilder {
    pub fn new(seed_url: &str, max_depth: usize) -> Self {
        Self {
            seed_url: seed_url.to_string(),
            max_depth,
            pages: Vec::new(),
        }
    }

    pub fn record(&mut self, record: PageRecord) {
        self.pages.push(record);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn finalize(self) -> Report {
        let mut summary = Summary {
            total_pages: self.pages.len(),
            ..Summary::default()
        };

        for page in &self.pages {
            *summary
                .pages_by_status
                .entry(page.fetch_status.as_str().to_string())
                .or_insert(0) += 1;
            for finding in &page.findings {
                *summary
                    .findings_by_severity
                    .entry(finding.severity.as_str().to_string())
                    .or_insert(0) += 1;
                *summary
                    .findings_by_rule
                    .entry(finding.rule.clone())
                    .or_insert(0) += 1;
            }
        }

        Report {
            seed_url: self.seed_url,
            max_depth: self.max_depth,
            pages: self.pages,
            summary,
        }
    }
}

pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn generate_text_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("                SITE AUDIT REPORT\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    out.push_str(&format!("Seed URL:    {}\n", report.seed_url));
    out.push_str(&format!("Max depth:   {}\n", report.max_depth));
    out.push_str(&format!(
        "Generated:   {}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push('\n');

    out.push_str("# Summary:\n");
    out.push_str(&format!("  Pages visited: {}\n", report.summary.total_pages));
    for (status, count) in &report.summary.pages_by_status {
        out.push_str(&format!("    {}: {}\n", status, count));
    }
    let total_findings: usize = report.summary.findings_by_severity.values().sum();
    out.push_str(&format!("  Findings: {}\n", total_findings));
    for (severity, count) in &report.summary.findings_by_severity {
        out.push_str(&format!("    {}: {}\n", severity, count));
    }
    if !report.summary.findings_by_rule.is_empty() {
        out.push_str("  By rule:\n");
        for (rule, count) in &report.summary.findings_by_rule {
            out.push_str(&format!("    {}: {}\n", rule, count));
        }
    }
    out.push('\n');

    out.push_str("# Pages:\n");
    for page in &report.pages {
        out.push_str(&format!(
            "  [{}] depth {}  {}\n",
            page.fetch_status.as_str(),
            page.depth,
            page.url
        ));
        if let Some(ref error) = page.error {
            out.push_str(&format!("      error: {}\n", error));
        }
        for finding in &page.findings {
            out.push_str(&format!(
                "      {} {}: {}\n",
                finding.severity.as_str(),
                finding.rule,
                finding.message
            ));
        }
    }

    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Default report file name, derived from the seed host the way people name
/// these by hand: `www.example.com` becomes `example.json`.
pub fn default_report_filename(seed_url: &str) -> String {
    let host = url::Url::parse(seed_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| "report".to_string());
    let name = host
        .trim_start_matches("www.")
        .split('.')
        .next()
        .unwrap_or("report")
        .to_string();
    format!("{}.json", name)
}
