pub mod canonical;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod limiter;
pub mod result;

pub use crawler::Crawler;
pub use error::{AuditError, FetchError};
pub use extractor::{Extractor, PageContent};
pub use fetcher::{FetchOptions, FetchResponse, Fetcher, HttpFetcher};
pub use limiter::HostRateLimiter;
pub use result::{FetchStatus, Finding, PageRecord, Severity};
