use crate::canonical::{canonicalize, same_site};
use crate::error::{AuditError, Result};
use crate::extractor::{Extractor, PageContent};
use crate::fetcher::{FetchOptions, Fetcher};
use crate::limiter::HostRateLimiter;
use crate::result::{FetchStatus, Finding, PageRecord};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type RecordCallback = Arc<dyn Fn(&PageRecord) + Send + Sync>;
/// Hook that turns extracted content into findings. Plugged in by the caller
/// so the engine stays ignorant of individual rules.
pub type AnalyzeCallback = Arc<dyn Fn(&PageContent) -> Vec<Finding> + Send + Sync>;

struct FrontierEntry {
    url: Url,
    key: String,
    depth: usize,
}

/// The shared crawl state. One mutex guards queue, visited and enqueued
/// together, which makes check-membership + insert a single atomic step —
/// the only correctness-critical synchronization point of the run.
struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    enqueued: HashSet<String>,
    claimed: usize,
}

enum Claim {
    Entry(FrontierEntry),
    Empty,
    Stop,
}

/// Breadth-first crawl engine over an injected fetch capability. A bounded
/// pool of workers consumes the shared FIFO frontier; each page runs
/// fetch -> extract -> analyze -> enqueue-children, and a single page's
/// failure is never fatal to the run.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<Extractor>,
    limiter: Arc<HostRateLimiter>,
    fetch_options: FetchOptions,
    max_depth: usize,
    max_pages: Option<usize>,
    time_budget: Option<Duration>,
    abort: Arc<AtomicBool>,
    analyzer: Option<AnalyzeCallback>,
    progress_callback: Option<ProgressCallback>,
    record_callback: Option<RecordCallback>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(Extractor::new()),
            limiter: Arc::new(HostRateLimiter::new(2.0)),
            fetch_options: FetchOptions::default(),
            max_depth: 1,
            max_pages: None,
            time_budget: None,
            abort: Arc::new(AtomicBool::new(false)),
            analyzer: None,
            progress_callback: None,
            record_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: f64) -> Self {
        self.limiter = Arc::new(HostRateLimiter::new(requests_per_second));
        self
    }

    pub fn with_analyzer(mut self, analyzer: AnalyzeCallback) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_record_callback(mut self, callback: RecordCallback) -> Self {
        self.record_callback = Some(callback);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Flag for caller-initiated abort; checked between dequeues. In-flight
    /// fetches complete normally and their records are kept.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    pub async fn crawl(&self, seed_url: &str, workers: usize) -> Result<Vec<PageRecord>> {
        let seed = Url::parse(seed_url)
            .map_err(|e| AuditError::Config(format!("invalid seed URL '{}': {}", seed_url, e)))?;
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(AuditError::Config(format!(
                "seed URL must be http or https, got '{}'",
                seed.scheme()
            )));
        }
        let site_host = seed
            .host_str()
            .ok_or_else(|| AuditError::Config(format!("seed URL '{}' has no host", seed_url)))?
            .to_string();

        let workers = workers.max(1);
        info!("Starting crawl of {} with {} workers", seed_url, workers);

        let seed_key = canonicalize(&seed);
        let mut frontier = Frontier {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            enqueued: HashSet::new(),
            claimed: 0,
        };
        frontier.enqueued.insert(seed_key.clone());
        frontier.queue.push_back(FrontierEntry {
            url: seed,
            key: seed_key,
            depth: 0,
        });

        let job = Arc::new(CrawlJob {
            fetcher: self.fetcher.clone(),
            extractor: self.extractor.clone(),
            limiter: self.limiter.clone(),
            fetch_options: self.fetch_options.clone(),
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            time_budget: self.time_budget,
            abort: self.abort.clone(),
            analyzer: self.analyzer.clone(),
            progress_callback: self.progress_callback.clone(),
            record_callback: self.record_callback.clone(),
            site_host,
            frontier: Mutex::new(frontier),
            records: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            started: Instant::now(),
        });

        let mut handles = Vec::new();
        for worker_id in 0..workers {
            let job = job.clone();
            handles.push(tokio::spawn(async move { job.run_worker(worker_id).await }));
        }
        for handle in handles {
            handle.await?;
        }

        let records = job.records.lock().await.clone();
        info!("Crawl complete. Visited {} pages", records.len());
        Ok(records)
    }
}

/// Per-run state shared by the worker pool.
struct CrawlJob {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<Extractor>,
    limiter: Arc<HostRateLimiter>,
    fetch_options: FetchOptions,
    max_depth: usize,
    max_pages: Option<usize>,
    time_budget: Option<Duration>,
    abort: Arc<AtomicBool>,
    analyzer: Option<AnalyzeCallback>,
    progress_callback: Option<ProgressCallback>,
    record_callback: Option<RecordCallback>,
    site_host: String,
    frontier: Mutex<Frontier>,
    records: Mutex<Vec<PageRecord>>,
    in_flight: AtomicUsize,
    started: Instant,
}

impl CrawlJob {
    async fn run_worker(&self, worker_id: usize) {
        debug!("Worker {} started", worker_id);

        loop {
            if self.abort.load(Ordering::Relaxed) {
                info!("Worker {} stopping: abort requested", worker_id);
                break;
            }
            if let Some(budget) = self.time_budget
                && self.started.elapsed() >= budget
            {
                info!("Worker {} stopping: time budget exhausted", worker_id);
                break;
            }

            match self.claim_next().await {
                Claim::Stop => {
                    info!("Worker {} stopping: page ceiling reached", worker_id);
                    break;
                }
                Claim::Empty => {
                    // The queue can refill while another worker's fetch is in
                    // flight, so only an empty queue with nothing in flight
                    // means the crawl is done.
                    if self.in_flight.load(Ordering::SeqCst) == 0 {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Claim::Entry(entry) => {
                    if let Some(ref callback) = self.progress_callback {
                        callback(worker_id, entry.key.clone());
                    }
                    self.visit(entry).await;
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }

        debug!("Worker {} finished", worker_id);
    }

    /// Pop the next entry and mark it visited in one atomic step. A key that
    /// is already visited (duplicate discovered before dequeue) is skipped,
    /// never an error.
    async fn claim_next(&self) -> Claim {
        let mut frontier = self.frontier.lock().await;

        if let Some(cap) = self.max_pages
            && frontier.claimed >= cap
        {
            return Claim::Stop;
        }

        while let Some(entry) = frontier.queue.pop_front() {
            frontier.enqueued.remove(&entry.key);
            if frontier.visited.contains(&entry.key) {
                debug!("Skipping already-visited {}", entry.key);
                continue;
            }
            frontier.visited.insert(entry.key.clone());
            frontier.claimed += 1;
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            return Claim::Entry(entry);
        }

        Claim::Empty
    }

    async fn visit(&self, entry: FrontierEntry) {
        if let Some(host) = entry.url.host_str() {
            self.limiter.acquire(host).await;
        }

        let response = match self.fetcher.fetch(&entry.url, &self.fetch_options).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Fetch failed for {}: {}", entry.key, e);
                self.emit(PageRecord::with_error(entry.key, entry.depth, e.to_string()))
                    .await;
                return;
            }
        };

        // Redirects: the visited key is the canonical form of where the
        // request landed, so a redirect loop cannot produce duplicate visits.
        let final_key = canonicalize(&response.final_url);
        if final_key != entry.key {
            let mut frontier = self.frontier.lock().await;
            if !frontier.visited.insert(final_key.clone()) {
                debug!("Redirect target {} already visited, skipping", final_key);
                return;
            }
        }

        let content = self.extractor.extract(&response.html, &response.final_url);
        let findings = match self.analyzer {
            Some(ref analyze) => analyze(&content),
            None => Vec::new(),
        };
        let fetch_status = if response.render_degraded {
            FetchStatus::RenderDegraded
        } else {
            FetchStatus::Ok
        };

        self.enqueue_children(&content, entry.depth).await;

        self.emit(PageRecord {
            url: final_key,
            depth: entry.depth,
            fetch_status,
            content: Some(content),
            findings,
            error: None,
        })
        .await;
    }

    /// Link discovery never touches `visited`; it only grows the queue, and
    /// only for same-site targets within the depth ceiling.
    async fn enqueue_children(&self, content: &PageContent, depth: usize) {
        if depth + 1 > self.max_depth {
            return;
        }

        for link in &content.links {
            let Ok(url) = Url::parse(link) else { continue };
            if !same_site(&url, &self.site_host) {
                continue;
            }
            let key = canonicalize(&url);

            let mut frontier = self.frontier.lock().await;
            if !frontier.visited.contains(&key) && frontier.enqueued.insert(key.clone()) {
                frontier.queue.push_back(FrontierEntry {
                    url,
                    key,
                    depth: depth + 1,
                });
            }
        }
    }

    async fn emit(&self, record: PageRecord) {
        if let Some(ref callback) = self.record_callback {
            callback(&record);
        }
        self.records.lock().await.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetcher::FetchResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubPage {
        html: String,
        final_url: Option<String>,
        render_degraded: bool,
    }

    /// In-memory fetcher keyed by canonical URL; unknown URLs fail.
    struct StubFetcher {
        pages: HashMap<String, StubPage>,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self { pages: HashMap::new() }
        }

        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                StubPage {
                    html: html.to_string(),
                    final_url: None,
                    render_degraded: false,
                },
            );
            self
        }

        fn redirect(mut self, url: &str, to: &str, html: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                StubPage {
                    html: html.to_string(),
                    final_url: Some(to.to_string()),
                    render_degraded: false,
                },
            );
            self
        }

        fn degraded(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                StubPage {
                    html: html.to_string(),
                    final_url: None,
                    render_degraded: true,
                },
            );
            self
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(
            &self,
            url: &Url,
            _options: &FetchOptions,
        ) -> std::result::Result<FetchResponse, FetchError> {
            let key = canonicalize(url);
            match self.pages.get(&key) {
                Some(page) => Ok(FetchResponse {
                    html: page.html.clone(),
                    final_url: page
                        .final_url
                        .as_ref()
                        .map(|u| Url::parse(u).unwrap())
                        .unwrap_or_else(|| url.clone()),
                    status_code: 200,
                    render_degraded: page.render_degraded,
                }),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn urls(records: &[PageRecord]) -> Vec<&str> {
        records.iter().map(|r| r.url.as_str()).collect()
    }

    #[tokio::test]
    async fn test_invalid_seed_is_a_config_error() {
        let crawler = Crawler::new(Arc::new(StubFetcher::new()));
        let err = crawler.crawl("not a url", 1).await.unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));

        let err = crawler.crawl("mailto:x@example.com", 1).await.unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[tokio::test]
    async fn test_render_degraded_is_recorded() {
        let fetcher = StubFetcher::new().degraded("https://example.com", "<html></html>");
        let crawler = Crawler::new(Arc::new(fetcher)).with_rate_limit(1000.0);

        let records = crawler.crawl("https://example.com", 1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fetch_status, FetchStatus::RenderDegraded);
        assert!(records[0].content.is_some());
    }

    #[tokio::test]
    async fn test_redirect_final_url_is_the_visited_key() {
        let fetcher = StubFetcher::new()
            .page(
                "https://example.com",
                r#"<a href="/a">a</a><a href="/b">b</a>"#,
            )
            .redirect("https://example.com/a", "https://example.com/b", "<p>b</p>")
            .page("https://example.com/b", "<p>b</p>");
        let crawler = Crawler::new(Arc::new(fetcher)).with_rate_limit(1000.0);

        let records = crawler.crawl("https://example.com", 1).await.unwrap();

        // /a redirected onto /b, so /b is recorded once, not twice.
        assert_eq!(
            urls(&records),
            vec!["https://example.com", "https://example.com/b"]
        );
    }

    #[tokio::test]
    async fn test_abort_stops_between_dequeues() {
        let fetcher = StubFetcher::new().page("https://example.com", r#"<a href="/a">a</a>"#);
        let crawler = Crawler::new(Arc::new(fetcher)).with_rate_limit(1000.0);

        crawler.abort_handle().store(true, Ordering::Relaxed);
        let records = crawler.crawl("https://example.com", 1).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_offsite_links_are_not_enqueued() {
        let fetcher = StubFetcher::new().page(
            "https://example.com",
            r#"<a href="https://other.org/x">x</a><a href="/local">l</a>"#,
        );
        let crawler = Crawler::new(Arc::new(fetcher)).with_rate_limit(1000.0);

        let records = crawler.crawl("https://example.com", 1).await.unwrap();
        let recorded = urls(&records);
        assert!(recorded.contains(&"https://example.com"));
        assert!(!recorded.iter().any(|u| u.contains("other.org")));
    }
}
