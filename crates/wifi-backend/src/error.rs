//! Error types for WiFi backends

use thiserror::Error;
use wifi_decode::DecodeError;

/// Errors that can occur while querying a backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The platform reports no wireless adapters
    #[error("no WiFi interfaces found")]
    NoInterfacesFound,

    /// The upstream tool refused the request for lack of privileges
    #[error("permission denied running {tool}: scanning requires elevated privileges (run with sudo or grant CAP_NET_ADMIN)")]
    PermissionDenied { tool: String },

    /// No supported upstream tool or API exists on this host, or the backend is closed
    #[error("WiFi backend unavailable: {0}")]
    BackendUnavailable(String),

    /// An upstream command ran past its deadline
    #[error("scan timed out after {timeout_ms} ms")]
    ScanTimeout { timeout_ms: u64 },

    /// Upstream output could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An upstream command exited unsuccessfully
    #[error("{command} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// Fetching a remote resource failed
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// I/O error spawning or reading a command
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Whether a lower-priority tool may be tried after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            BackendError::NoInterfacesFound | BackendError::PermissionDenied { .. }
        )
    }
}
