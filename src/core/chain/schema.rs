//! Schema introspection against the engine's live schema.

use crate::core::chain::SchemaContext;
use crate::core::decode;
use crate::core::error::Result;
use crate::core::protocol::Call;
use crate::core::session::Session;
use crate::core::types::{FieldHandle, SchemaDescription};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Schema {
    ctx: SchemaContext,
}

impl Schema {
    pub(crate) fn new(ctx: SchemaContext) -> Self {
        Self { ctx }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    /// Schema as decoded at build time, without a round trip
    pub fn description(&self) -> &SchemaDescription {
        &self.ctx.schema
    }

    /// Full engine-side description of one field (type, options)
    pub fn get_field_entry(&self, name: &str) -> Result<Value> {
        let payload = self.ctx.call(&Call::GetFieldEntry(name))?;
        decode::field_entry(&payload)
    }

    pub fn num_fields(&self) -> Result<u64> {
        let payload = self.ctx.call(&Call::NumFields)?;
        decode::num_fields(&payload)
    }

    /// Field names in handle order
    pub fn fields(&self) -> Result<Vec<String>> {
        let payload = self.ctx.call(&Call::Fields)?;
        decode::field_names(&payload)
    }

    pub fn get_field(&self, name: &str) -> Result<FieldHandle> {
        let call = Call::GetField(name);
        let payload = self.ctx.call(&call)?;
        decode::field_handle(call.method(), &payload)
    }

    pub fn get_field_name(&self, field: FieldHandle) -> Result<String> {
        let payload = self.ctx.call(&Call::GetFieldName(field))?;
        decode::field_name(&payload)
    }
}
