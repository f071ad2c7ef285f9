//! Fetch error type shared by HTTP clients and the downloader.

use thiserror::Error;

/// Why a tile body could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Connection, timeout, or body read failure.
    #[error("Request failed: {0}")]
    Network(String),

    /// HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// Fetch was aborted before it completed.
    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}
