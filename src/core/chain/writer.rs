//! Writer stage: add, delete and commit.

use crate::core::chain::SchemaContext;
use crate::core::decode;
use crate::core::error::Result;
use crate::core::protocol::Call;
use crate::core::session::Session;
use crate::core::types::{CommitId, DocHandle, Opstamp};
use std::sync::Arc;

/// Mutates the index; stays usable after `commit`
#[derive(Debug, Clone)]
pub struct Writer {
    ctx: SchemaContext,
}

impl Writer {
    pub(crate) fn new(ctx: SchemaContext) -> Self {
        Self { ctx }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    /// Queue a populated document for indexing
    pub fn add_document(&self, doc: DocHandle) -> Result<Opstamp> {
        self.ctx.session().check_document(doc)?;
        let call = Call::AddDocument(doc);
        let payload = self.ctx.call(&call)?;
        decode::opstamp(call.method(), &payload)
    }

    /// Delete every document whose `field` holds `term`
    pub fn delete_term(&self, field: &str, term: &str) -> Result<Opstamp> {
        self.ctx.require_field(field)?;
        let call = Call::DeleteTerm { field, term };
        let payload = self.ctx.call(&call)?;
        decode::opstamp(call.method(), &payload)
    }

    /// Make queued operations durable
    pub fn commit(&self) -> Result<CommitId> {
        let payload = self.ctx.call(&Call::Commit)?;
        let id = decode::commit_id(&payload)?;
        tracing::info!("Session {} committed ({})", self.ctx.session().id(), id);
        Ok(id)
    }
}
