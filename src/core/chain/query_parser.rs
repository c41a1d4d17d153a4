//! Query parser stage.

use crate::core::chain::{FuzzySearcher, SchemaContext, Searcher};
use crate::core::error::{GateError, Result};
use crate::core::protocol::Call;
use crate::core::session::{Session, Slot, Stamp};
use std::sync::Arc;

/// Turns query text into a searcher
#[derive(Debug, Clone)]
pub struct QueryParser {
    ctx: SchemaContext,
    stamp: Stamp,
}

impl QueryParser {
    pub(crate) fn new(ctx: SchemaContext, stamp: Stamp) -> Self {
        Self { ctx, stamp }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    /// Set the default fields searched by unqualified terms
    pub fn for_index(&self, fields: &[&str]) -> Result<()> {
        fields
            .iter()
            .try_for_each(|field| self.ctx.require_field(field))?;
        self.ctx
            .call_bound(&Call::ForIndex(fields), self.stamp, &[Slot::Lease], &[])?;
        Ok(())
    }

    /// Parse query text; syntax and unknown-field failures are query errors
    pub fn parse_query(&self, query: &str) -> Result<Searcher> {
        let (_, stamp) = self
            .ctx
            .call_bound(
                &Call::ParseQuery(query),
                self.stamp,
                &[Slot::Lease],
                &[Slot::Query],
            )
            .map_err(into_query_error)?;
        Ok(Searcher::new(self.ctx.clone(), stamp))
    }

    /// Build a fuzzy term query with the configured edit distance
    pub fn parse_fuzzy_query(&self, field: &str, term: &str) -> Result<FuzzySearcher> {
        self.ctx.require_field(field)?;
        let call = Call::ParseFuzzyQuery {
            field,
            term,
            distance: self.ctx.stage.config.search.fuzzy_distance,
        };
        let (_, stamp) = self
            .ctx
            .call_bound(&call, self.stamp, &[Slot::Lease], &[Slot::FuzzyQuery])
            .map_err(into_query_error)?;
        Ok(FuzzySearcher::new(self.ctx.clone(), stamp))
    }
}

fn into_query_error(err: GateError) -> GateError {
    match err {
        GateError::Remote { message, .. } => GateError::Query(message),
        other => other,
    }
}
