//! Failures raised while serving a request inside the embedded engine.
//!
//! These never cross the call gate as Rust values; each is rendered
//! into an `{"error": ...}` reply.

use tantivy::query::QueryParserError;
use tantivy::TantivyError;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("bad parameters: {0}")]
    BadParams(String),

    #[error("not ready: {0}")]
    NotReady(String),

    #[error("does not exist: {0}")]
    NotExist(String),

    #[error("unrecognized method: {0}")]
    Unrecognized(String),

    #[error("query parser error: {0}")]
    Query(#[from] QueryParserError),

    #[error("tantivy error: {0}")]
    Tantivy(#[from] TantivyError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EngineError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        EngineError::BadParams(message.into())
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        EngineError::NotReady(message.into())
    }
}
