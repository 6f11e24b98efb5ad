//! Error types for the WiFi engine

use thiserror::Error;
use wifi_backend::BackendError;

/// Errors that can occur in the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A poll loop is already running
    #[error("scanning already in progress")]
    AlreadyScanning,

    /// Backend error
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A backend call did not finish in time
    #[error("backend call timed out after {timeout_ms}ms")]
    ScanTimeout {
        /// Deadline that was exceeded (milliseconds)
        timeout_ms: u64,
    },

    /// The blocking worker running a backend call panicked or was cancelled
    #[error("backend worker failed: {0}")]
    Worker(String),
}
