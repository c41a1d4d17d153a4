//! Schema builder: the first stage of every session.

use crate::core::chain::{Document, SchemaContext, StageContext};
use crate::core::config::Config;
use crate::core::decode;
use crate::core::error::{GateError, Result};
use crate::core::protocol::Call;
use crate::core::session::Session;
use crate::core::types::{FieldHandle, FieldKind, FieldOptions, FieldSpec};
use std::sync::Arc;

/// Declares fields, then builds the schema
///
/// `build` consumes the builder, so no field can be added afterwards.
#[derive(Debug)]
pub struct SchemaBuilder {
    ctx: StageContext,
    declared: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub(crate) fn new(session: Arc<Session>, config: Arc<Config>) -> Self {
        Self {
            ctx: StageContext { session, config },
            declared: Vec::new(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.ctx.session
    }

    /// Declare one field; handles are issued 0, 1, 2, ...
    pub fn add_field(&mut self, spec: FieldSpec) -> Result<FieldHandle> {
        if self.declared.iter().any(|f| f.name == spec.name) {
            return Err(GateError::Validation(format!(
                "field '{}' already declared",
                spec.name
            )));
        }
        let call = Call::AddField(&spec);
        let payload = self.ctx.call(&call)?;
        let handle = decode::field_handle(call.method(), &payload)?;
        tracing::debug!("Declared field '{}' as {}", spec.name, handle);
        self.declared.push(spec);
        Ok(handle)
    }

    pub fn add_text_field(&mut self, name: &str, options: FieldOptions) -> Result<FieldHandle> {
        self.add_field(FieldSpec::new(name, FieldKind::Text, options))
    }

    pub fn add_json_field(&mut self, name: &str, options: FieldOptions) -> Result<FieldHandle> {
        self.add_field(FieldSpec::new(name, FieldKind::Json, options))
    }

    pub fn add_date_field(&mut self, name: &str, options: FieldOptions) -> Result<FieldHandle> {
        self.add_field(FieldSpec::new(name, FieldKind::Date, options))
    }

    pub fn add_u64_field(&mut self, name: &str, options: FieldOptions) -> Result<FieldHandle> {
        self.add_field(FieldSpec::new(name, FieldKind::U64, options))
    }

    pub fn add_i64_field(&mut self, name: &str, options: FieldOptions) -> Result<FieldHandle> {
        self.add_field(FieldSpec::new(name, FieldKind::I64, options))
    }

    pub fn add_f64_field(&mut self, name: &str, options: FieldOptions) -> Result<FieldHandle> {
        self.add_field(FieldSpec::new(name, FieldKind::F64, options))
    }

    /// Finalize the schema and move to document population
    pub fn build(self) -> Result<Document> {
        let payload = self.ctx.call(&Call::BuildSchema)?;
        let schema = decode::schema(&payload)?;
        if schema.len() != self.declared.len() {
            tracing::warn!(
                "Engine schema has {} fields, {} were declared",
                schema.len(),
                self.declared.len()
            );
        }
        tracing::debug!(
            "Session {} built schema with {} fields",
            self.ctx.session.id(),
            schema.len()
        );
        Ok(Document::new(SchemaContext {
            stage: self.ctx,
            schema: Arc::new(schema),
        }))
    }
}
