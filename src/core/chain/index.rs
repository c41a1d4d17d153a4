//! Index stage.

use crate::core::chain::{Reader, Schema, SchemaContext, Writer};
use crate::core::error::Result;
use crate::core::protocol::Call;
use crate::core::session::{IndexLocation, Session, Slot, Stamp};
use std::sync::Arc;

/// A created index; hands out writers, readers and the schema introspector
#[derive(Debug, Clone)]
pub struct Index {
    ctx: SchemaContext,
    location: IndexLocation,
}

impl Index {
    pub(crate) fn new(ctx: SchemaContext, location: IndexLocation) -> Self {
        Self { ctx, location }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    pub fn location(&self) -> &IndexLocation {
        &self.location
    }

    /// The engine opens its writer on first use, so this is local
    pub fn create_writer(&self) -> Writer {
        Writer::new(self.ctx.clone())
    }

    /// Open a reader over the index as it stands now
    ///
    /// Supersedes any earlier reader of the session.
    pub fn create_reader_builder(&self) -> Result<Reader> {
        let (_, stamp) =
            self.ctx
                .call_bound(&Call::ReaderBuilder, Stamp::default(), &[], &[Slot::Reader])?;
        Ok(Reader::new(self.ctx.clone(), stamp))
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.ctx.clone())
    }
}
