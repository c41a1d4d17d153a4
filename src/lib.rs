//! searchgate - session-scoped client for a stateful full-text engine
//!
//! Drives a remote indexing engine through a single narrow call gate:
//! a serialized request goes in, a serialized response comes back.
//!
//! # Architecture
//!
//! - **core**: the protocol layer
//!   - protocol (envelope codec, typed calls)
//!   - transport (call gate, response buffers, native binding)
//!   - session, chain (capability state machine), decode
//!   - client, config, error, types
//!
//! - **engine** (feature `embedded-engine`): an in-process engine
//!   answering the same protocol through tantivy
//!
//! # Workflow
//!
//! session -> schema -> document -> index -> writer / reader ->
//! query parser -> searcher -> decoded hits, every step one call
//! through the gate scoped by the session id.

// Protocol layer
pub mod core;

// In-process engine host
#[cfg(feature = "embedded-engine")]
pub mod engine;

// Re-export commonly used types for convenience
pub use crate::core::chain::{
    Document, FuzzySearcher, Index, QueryParser, Reader, Schema, SchemaBuilder, Searcher, Writer,
};
pub use crate::core::client::Client;
pub use crate::core::config::Config;
pub use crate::core::error::{GateError, Result, TransportError};
pub use crate::core::session::Session;
pub use crate::core::transport::{CallGate, ForeignGate, GateReply, NativeEntryPoints};
pub use crate::core::types::*;

#[cfg(feature = "embedded-engine")]
pub use crate::engine::LocalEngine;
