//! Capability chain: each stage is obtainable only from the previous one.
//!
//! ```text
//! SchemaBuilder -> Document -> Index -> Writer
//!                                    -> Reader -> QueryParser -> Searcher
//!                                                             -> FuzzySearcher
//!                                    -> Schema
//! ```
//!
//! Every stage holds the shared session, so any of them may release it.
//!
//! The engine keeps one reader, one leased searcher and one parsed query
//! per session. Handles remember the generation they were issued at and
//! fail with `IllegalTransition` once a newer sibling replaced their
//! engine-side object.

pub mod builder;
pub mod document;
pub mod index;
pub mod query_parser;
pub mod reader;
pub mod schema;
pub mod searcher;
pub mod writer;

pub use builder::SchemaBuilder;
pub use document::Document;
pub use index::Index;
pub use query_parser::QueryParser;
pub use reader::Reader;
pub use schema::Schema;
pub use searcher::{FuzzySearcher, Searcher};
pub use writer::Writer;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::protocol::Call;
use crate::core::session::{Session, Slot, Stamp};
use crate::core::types::SchemaDescription;
use serde_json::Value;
use std::sync::Arc;

/// State every stage carries forward
#[derive(Debug, Clone)]
pub(crate) struct StageContext {
    pub session: Arc<Session>,
    pub config: Arc<Config>,
}

impl StageContext {
    pub fn call(&self, call: &Call<'_>) -> Result<Value> {
        self.session.call(call)
    }
}

/// Stages that also know the built schema
#[derive(Debug, Clone)]
pub(crate) struct SchemaContext {
    pub stage: StageContext,
    pub schema: Arc<SchemaDescription>,
}

impl SchemaContext {
    pub fn call(&self, call: &Call<'_>) -> Result<Value> {
        self.stage.call(call)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.stage.session
    }

    /// Call on behalf of a handle issued at `held`, see [`Session::call_bound`]
    pub fn call_bound(
        &self,
        call: &Call<'_>,
        held: Stamp,
        requires: &[Slot],
        supersedes: &[Slot],
    ) -> Result<(Value, Stamp)> {
        self.stage.session.call_bound(call, held, requires, supersedes)
    }

    /// Fail unless `name` is a field of the built schema
    pub fn require_field(&self, name: &str) -> Result<()> {
        if self.schema.handle_of(name).is_none() {
            return Err(crate::core::error::GateError::Validation(format!(
                "unknown field '{name}'"
            )));
        }
        Ok(())
    }
}
