//! Error types and error handling for the searchgate client.
//!
//! Every failure is classified into one of four protocol kinds
//! (validation, transport, remote, decode) plus the ambient
//! configuration and I/O kinds. Nothing is retried here; the
//! transport adapter owns the single overflow retry.

use thiserror::Error;

/// Result type alias for searchgate operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Transport-level faults: the call gate failed independently of the payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Response needs {required} bytes, exceeding the {limit} byte ceiling")]
    BufferTooSmall { required: usize, limit: usize },

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Session already released: {0}")]
    SessionReleased(String),

    #[error("Call gate returned status {status} without a description")]
    Fault { status: i64 },

    #[error("Session lock poisoned: {0}")]
    Poisoned(String),
}

/// Main error type for the searchgate client
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote error from {object}.{method}: {message}")]
    Remote {
        object: String,
        method: String,
        message: String,
    },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Decode error in {method}: expected '{key}' ({detail})")]
    Decode {
        method: String,
        key: String,
        detail: String,
    },

    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl GateError {
    /// Build a decode error naming the key the caller expected
    pub fn decode(method: &str, key: &str, detail: impl Into<String>) -> Self {
        GateError::Decode {
            method: method.to_string(),
            key: key.to_string(),
            detail: detail.into(),
        }
    }

    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Rejected before the request left the client
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GateError::Validation(_) | GateError::IllegalTransition(_)
        )
    }

    /// Call gate failed without a remote description
    pub fn is_transport(&self) -> bool {
        matches!(self, GateError::Transport(_))
    }

    /// Engine executed the call and reported a failure
    pub fn is_remote(&self) -> bool {
        matches!(self, GateError::Remote { .. } | GateError::Query(_))
    }

    /// Response arrived but lacked the expected field
    pub fn is_decode(&self) -> bool {
        matches!(self, GateError::Decode { .. })
    }
}
