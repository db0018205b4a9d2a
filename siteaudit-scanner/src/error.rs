use std::time::Duration;
use thiserror::Error;

/// Run-level errors. Only `Config` aborts a run before any fetch; everything
/// page-scoped is absorbed into the report data model instead.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Final outcome of a failed fetch, after the transport's internal retries.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}
