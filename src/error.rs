// src/error.rs
//! Error taxonomy.
//!
//! Startup errors (`ConfigError`, `StoreError::Init`, `AdapterLoadError`) end the
//! process. Everything else is recovered at the scope where it happens and only
//! logged: a failed fetch empties one adapter call, a malformed listing is
//! skipped, a failed row insert is skipped.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::Platform;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    Missing { path: PathBuf },
    #[error("reading configuration from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing configuration from {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("initializing result store at {}", path.display())]
    Init {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
    #[error("result store query failed")]
    Query(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
#[error("no platform adapters could be loaded (requested: {requested:?})")]
pub struct AdapterLoadError {
    pub requested: Vec<String>,
}

/// Anything that stops the binary before the first cycle.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    AdapterLoad(#[from] AdapterLoadError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailureReason {
    Timeout,
    Connect,
    Status(u16),
    Body(String),
    Request(String),
}

impl std::fmt::Display for FetchFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Body(e) => write!(f, "reading body: {e}"),
            Self::Request(e) => write!(f, "{e}"),
        }
    }
}

/// One request that did not produce a usable page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("fetching {url}: {reason}")]
pub struct FetchFailure {
    pub url: String,
    pub reason: FetchFailureReason,
}

impl FetchFailure {
    pub fn new(url: impl Into<String>, reason: FetchFailureReason) -> Self {
        Self {
            url: url.into(),
            reason,
        }
    }

    pub(crate) fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        let reason = if e.is_timeout() {
            FetchFailureReason::Timeout
        } else if e.is_connect() {
            FetchFailureReason::Connect
        } else if let Some(status) = e.status() {
            FetchFailureReason::Status(status.as_u16())
        } else if e.is_body() || e.is_decode() {
            FetchFailureReason::Body(e.to_string())
        } else {
            FetchFailureReason::Request(e.to_string())
        };
        Self::new(url, reason)
    }
}

/// An anti-scraping page was served instead of search results.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{platform} served a block page ({signature})")]
pub struct BlockDetected {
    pub platform: Platform,
    pub signature: &'static str,
}

/// Why a single raw listing was dropped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("sponsored placement")]
    Sponsored,
    #[error("missing title")]
    MissingTitle,
    #[error("missing or unparsable price")]
    MissingPrice,
    #[error("missing or unresolvable link")]
    MissingLink,
    #[error("malformed listing: {0}")]
    Malformed(String),
}
