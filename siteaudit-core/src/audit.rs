use crate::analysis::RuleSet;
use crate::report::{Report, ReportBuilder};
use siteaudit_scanner::crawler::Crawler;
use siteaudit_scanner::error::{AuditError, Result};
use siteaudit_scanner::fetcher::{FetchOptions, HttpFetcher};
use siteaudit_scanner::result::PageRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Options for configuring an audit run.
pub struct AuditOptions {
    pub seed_url: String,
    /// Validated non-negative before any fetch; the CLI passes it through
    /// unchecked.
    pub max_depth: i64,
    pub workers: usize,
    pub timeout: Duration,
    pub requests_per_second: f64,
    pub max_pages: Option<usize>,
    pub time_budget: Option<Duration>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            max_depth: 1,
            workers: 10,
            timeout: Duration::from_secs(10),
            requests_per_second: 2.0,
            max_pages: None,
            time_budget: None,
        }
    }
}

/// Callback for reporting audit progress, (worker id, url).
pub type AuditProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Callback for observing page records as they arrive.
pub type AuditRecordCallback = Arc<dyn Fn(&PageRecord) + Send + Sync>;

/// Run a full audit: crawl breadth-first from the seed, analyze every page
/// with the built-in rules, aggregate into a frozen report.
///
/// Configuration problems are the only run-level failures; per-page fetch
/// failures are recorded in the report and do not fail the run.
pub async fn execute_audit(
    options: AuditOptions,
    progress_callback: Option<AuditProgressCallback>,
    record_callback: Option<AuditRecordCallback>,
) -> Result<Report> {
    let AuditOptions {
        seed_url,
        max_depth,
        workers,
        timeout,
        requests_per_second,
        max_pages,
        time_budget,
    } = options;

    let seed = Url::parse(&seed_url)
        .map_err(|e| AuditError::Config(format!("invalid seed URL '{}': {}", seed_url, e)))?;
    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(AuditError::Config(format!(
            "seed URL must be http or https, got '{}'",
            seed.scheme()
        )));
    }
    if max_depth < 0 {
        return Err(AuditError::Config(format!(
            "max depth must be non-negative, got {}",
            max_depth
        )));
    }

    info!(
        "Auditing {} (depth {}, {} workers)",
        seed_url, max_depth, workers
    );

    let fetcher = Arc::new(HttpFetcher::with_timeout(timeout.as_secs().max(1)));
    let fetch_options = FetchOptions {
        timeout,
        ..FetchOptions::default()
    };

    let mut crawler = Crawler::new(fetcher)
        .with_max_depth(max_depth as usize)
        .with_fetch_options(fetch_options)
        .with_rate_limit(requests_per_second)
        .with_analyzer(RuleSet::builtin().into_callback());

    if let Some(callback) = progress_callback {
        crawler = crawler.with_progress_callback(callback);
    }
    if let Some(callback) = record_callback {
        crawler = crawler.with_record_callback(callback);
    }
    if let Some(cap) = max_pages {
        crawler = crawler.with_max_pages(cap);
    }
    if let Some(budget) = time_budget {
        crawler = crawler.with_time_budget(budget);
    }

    let records = crawler.crawl(&seed_url, workers).await?;

    let mut builder = ReportBuilder::new(&seed_url, max_depth as usize);
    for record in records {
        builder.record(record);
    }
    Ok(builder.finalize())
}
