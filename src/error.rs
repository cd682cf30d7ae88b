//! Error taxonomy.
//!
//! One enum per failure class. Only `ConfigError` is fatal; everything else
//! is recovered at per-target granularity by the cycle orchestrator.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems, detected before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no target URLs configured; set VIGIL_URLS or pass --urls")]
    NoTargets,

    #[error("invalid VIGIL_KEEP value '{0}': expected a non-negative integer")]
    InvalidKeep(String),
}

/// Page retrieval failures. Non-2xx responses are surfaced as their own
/// variant so callers never have to parse error strings.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request for {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Snapshot store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not determine data directory")]
    NoDataDir,

    #[error("failed to prepare storage at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

/// Notification failures. Missing credentials and an empty recipient list
/// are ordinary degraded modes, not crashes.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("RESEND_API_KEY not set")]
    MissingApiKey,

    #[error("EMAIL_RECIPIENTS empty")]
    NoRecipients,

    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification API returned status {0}")]
    Status(u16),
}
