use crate::extractor::PageContent;
use serde::{Deserialize, Serialize};

/// Final fetch outcome for one page. The serialized names are part of the
/// report compatibility surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchStatus {
    Ok,
    FetchFailed,
    RenderDegraded,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::FetchFailed => "fetchFailed",
            FetchStatus::RenderDegraded => "renderDegraded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// One output of a single analysis rule against one page. Immutable once
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Value>,
}

impl Finding {
    pub fn new(rule: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            message: message.into(),
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: serde_json::Value) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

/// Everything the crawl produced for one visited URL. Created once per page,
/// never mutated after analysis completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    pub depth: usize,
    pub fetch_status: FetchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<PageContent>,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            depth,
            fetch_status: FetchStatus::Ok,
            content: None,
            findings: Vec::new(),
            error: None,
        }
    }

    pub fn with_error(url: String, depth: usize, error: String) -> Self {
        Self {
            url,
            depth,
            fetch_status: FetchStatus::FetchFailed,
            content: None,
            findings: Vec::new(),
            error: Some(error),
        }
    }
}
