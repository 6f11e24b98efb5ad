//! Error types for output decoding

use thiserror::Error;

/// Errors raised when upstream output cannot be mapped to even a partial record
///
/// Malformed fields and truncated records are skipped silently; these errors
/// are reserved for payloads that are unreadable as a whole.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Output does not have the expected overall shape
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// JSON payload did not parse
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// XML payload did not parse
    #[error("invalid XML: {0}")]
    Xml(String),

    /// The decoder has no parser for this kind of query
    #[error("{decoder} cannot decode {operation} output")]
    Unsupported {
        decoder: &'static str,
        operation: &'static str,
    },
}

impl From<quick_xml::Error> for DecodeError {
    fn from(err: quick_xml::Error) -> Self {
        DecodeError::Xml(err.to_string())
    }
}
