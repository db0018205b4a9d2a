use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Per-request knobs handed to the transport. `scrolldown` and `render_wait`
/// only matter to rendering transports; the plain HTTP transport ignores them.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// Additional attempts after the first, on transient failure.
    pub retries: usize,
    /// Base backoff between attempts, doubled each retry.
    pub backoff: Duration,
    pub scrolldown: u32,
    pub render_wait: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 2,
            backoff: Duration::from_millis(250),
            scrolldown: 2,
            render_wait: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub html: String,
    /// Where the request actually landed after redirects. The crawl engine
    /// keys the visited set on this, not on the requested URL.
    pub final_url: Url,
    pub status_code: u16,
    /// Set by rendering transports that fell back to raw, unrendered markup.
    pub render_degraded: bool,
}

/// The external fetch capability. Retries and backoff are internal to the
/// implementation; callers observe only the final outcome.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<FetchResponse, FetchError>;
}

/// Plain HTTP transport over reqwest. No JavaScript rendering, so
/// `render_degraded` is always false here.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Siteaudit/0.1 (https://github.com/siteaudit/siteaudit)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    async fn attempt(&self, url: &Url, options: &FetchOptions) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| classify(e, options.timeout))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();

        if !response.status().is_success() {
            return Err(FetchError::Status(status_code));
        }

        let html = response
            .text()
            .await
            .map_err(|e| classify(e, options.timeout))?;

        Ok(FetchResponse {
            html,
            final_url,
            status_code,
            render_degraded: false,
        })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Transport(err)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<FetchResponse, FetchError> {
        let mut backoff = options.backoff;
        let mut last_err = None;

        for attempt in 0..=options.retries {
            if attempt > 0 {
                debug!("Retrying {} (attempt {})", url, attempt + 1);
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.attempt(url, options).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!("Fetch attempt {} for {} failed: {}", attempt + 1, url, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.expect("at least one attempt is always made"))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}
