//! Searcher stage: run the parsed query and fetch results.

use crate::core::chain::SchemaContext;
use crate::core::decode;
use crate::core::error::{GateError, Result};
use crate::core::protocol::Call;
use crate::core::session::{Session, Slot, Stamp};
use crate::core::types::{
    DocHandle, DocsetEntry, FieldHandle, FieldKind, Hit, SearchOptions, Snippet, TopLimit,
};
use serde_json::Value;
use std::sync::Arc;

/// Executes the query it was parsed from
///
/// Valid until the session leases a newer searcher or parses another
/// query; after that every call fails with `IllegalTransition`.
#[derive(Debug, Clone)]
pub struct Searcher {
    ctx: SchemaContext,
    stamp: Stamp,
}

impl Searcher {
    pub(crate) fn new(ctx: SchemaContext, stamp: Stamp) -> Self {
        Self { ctx, stamp }
    }

    fn run(&self, call: &Call<'_>) -> Result<Value> {
        let (payload, _) =
            self.ctx
                .call_bound(call, self.stamp, &[Slot::Lease, Slot::Query], &[])?;
        Ok(payload)
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    /// Ranked search; hits come back in engine order
    pub fn search(&self, options: &SearchOptions) -> Result<Vec<Hit>> {
        options
            .snippet_fields
            .iter()
            .try_for_each(|field| self.ctx.require_field(field))?;
        let call = Call::Search(options);
        let payload = self.run(&call)?;
        let hits = decode::hits(call.method(), &payload)?;
        tracing::debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }

    /// Search with the engine's defaults
    pub fn search_raw(&self) -> Result<Vec<Hit>> {
        let call = Call::SearchRaw;
        let payload = self.run(&call)?;
        decode::hits(call.method(), &payload)
    }

    /// Result addresses only, to be hydrated with `get_document`
    pub fn docset(
        &self,
        scoring: bool,
        top_limit: TopLimit,
        offset: u64,
    ) -> Result<Vec<DocsetEntry>> {
        let payload = self.run(&Call::Docset {
            scoring,
            top_limit,
            offset,
        })?;
        decode::docset(&payload)
    }

    /// Fetch the stored fields of one docset entry
    pub fn get_document(
        &self,
        entry: &DocsetEntry,
        explain: bool,
        snippet_fields: &[&str],
    ) -> Result<Hit> {
        snippet_fields
            .iter()
            .try_for_each(|field| self.ctx.require_field(field))?;
        let snippet_fields: Vec<String> = snippet_fields.iter().map(|f| f.to_string()).collect();
        let payload = self.run(&Call::GetDocument {
            entry,
            explain,
            snippet_fields: &snippet_fields,
        })?;
        decode::hit(&payload)
    }

    /// Highlight the query's matches in unindexed session documents
    pub fn snippet(&self, field: FieldHandle, docs: &[DocHandle]) -> Result<Vec<Snippet>> {
        match self.ctx.schema.field(field) {
            Some(description) if description.kind == FieldKind::Text => {}
            Some(description) => {
                return Err(GateError::Validation(format!(
                    "snippets need a text field, '{}' is {:?}",
                    description.name, description.kind
                )))
            }
            None => {
                return Err(GateError::Validation(format!(
                    "field handle {field} does not exist"
                )))
            }
        }
        docs.iter()
            .try_for_each(|doc| self.ctx.session().check_document(*doc))?;
        let payload = self.run(&Call::Snippet { field, docs })?;
        decode::snippets(&payload)
    }
}

/// Executes the fuzzy query it was parsed from
#[derive(Debug, Clone)]
pub struct FuzzySearcher {
    ctx: SchemaContext,
    stamp: Stamp,
}

impl FuzzySearcher {
    pub(crate) fn new(ctx: SchemaContext, stamp: Stamp) -> Self {
        Self { ctx, stamp }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    pub fn fuzzy_search(&self, top_limit: TopLimit) -> Result<Vec<Hit>> {
        let call = Call::FuzzySearch(top_limit);
        let (payload, _) = self.ctx.call_bound(
            &call,
            self.stamp,
            &[Slot::Lease, Slot::FuzzyQuery],
            &[],
        )?;
        decode::hits(call.method(), &payload)
    }
}
