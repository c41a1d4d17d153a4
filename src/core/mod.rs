//! Protocol layer (engine-agnostic)
//!
//! Everything here talks to the engine only through a [`CallGate`].
//!
//! # Architecture
//!
//! - **protocol**: Request envelopes and the typed call catalog
//! - **transport**: Call gate contract, status codes, response buffers
//! - **session**: Session identity, serialization and teardown
//! - **chain**: Capability stages from schema builder to searcher
//! - **decode**: Typed extraction of response payloads
//! - **client**: Entry point owning the gate and configuration
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Handles, field descriptors and result shapes
//!
//! [`CallGate`]: crate::core::transport::CallGate

pub mod chain;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

// Re-export key types for convenience
pub use client::Client;
pub use config::Config;
pub use error::{GateError, Result};
