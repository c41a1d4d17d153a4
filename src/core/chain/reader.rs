//! Reader stage.

use crate::core::chain::{QueryParser, SchemaContext};
use crate::core::error::Result;
use crate::core::protocol::Call;
use crate::core::session::{Session, Slot, Stamp};
use std::sync::Arc;

/// Point-in-time view of the index, fixed when the reader was built
#[derive(Debug, Clone)]
pub struct Reader {
    ctx: SchemaContext,
    stamp: Stamp,
}

impl Reader {
    pub(crate) fn new(ctx: SchemaContext, stamp: Stamp) -> Self {
        Self { ctx, stamp }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    /// Lease a searcher and hand out a query parser bound to it
    ///
    /// Fails with `IllegalTransition` once a newer reader exists.
    pub fn searcher_builder(&self) -> Result<QueryParser> {
        let (_, stamp) = self.ctx.call_bound(
            &Call::LeaseSearcher,
            self.stamp,
            &[Slot::Reader],
            &[Slot::Lease],
        )?;
        Ok(QueryParser::new(self.ctx.clone(), stamp))
    }
}
