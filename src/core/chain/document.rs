//! Document stage: populate in-progress documents, then create the index.

use crate::core::chain::{Index, SchemaContext};
use crate::core::decode;
use crate::core::error::{GateError, Result};
use crate::core::protocol::{Call, FieldValue};
use crate::core::session::{IndexLocation, Session};
use crate::core::types::{DocHandle, FieldHandle, FieldKind, SchemaDescription};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Creates documents and attaches values to them
#[derive(Debug, Clone)]
pub struct Document {
    ctx: SchemaContext,
}

impl Document {
    pub(crate) fn new(ctx: SchemaContext) -> Self {
        Self { ctx }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.ctx.session()
    }

    /// The schema as the engine reported it at build time
    pub fn schema_description(&self) -> &SchemaDescription {
        &self.ctx.schema
    }

    /// Start a new empty document; handles are issued 1, 2, 3, ...
    pub fn create_document(&self) -> Result<DocHandle> {
        let payload = self.ctx.call(&Call::CreateDocument)?;
        let doc = decode::document_count(&payload)?;
        self.ctx.session().record_document(doc);
        Ok(doc)
    }

    pub fn add_text(&self, field: FieldHandle, value: &str, doc: DocHandle) -> Result<()> {
        self.add_value(field, doc, FieldValue::Text(value))
    }

    pub fn add_int(&self, field: FieldHandle, value: i64, doc: DocHandle) -> Result<()> {
        self.add_value(field, doc, FieldValue::I64(value))
    }

    pub fn add_uint(&self, field: FieldHandle, value: u64, doc: DocHandle) -> Result<()> {
        self.add_value(field, doc, FieldValue::U64(value))
    }

    pub fn add_f64(&self, field: FieldHandle, value: f64, doc: DocHandle) -> Result<()> {
        self.add_value(field, doc, FieldValue::F64(value))
    }

    /// Dates travel as unix microseconds
    pub fn add_date(&self, field: FieldHandle, value: DateTime<Utc>, doc: DocHandle) -> Result<()> {
        self.add_value(field, doc, FieldValue::Date(value))
    }

    fn add_value(&self, field: FieldHandle, doc: DocHandle, value: FieldValue<'_>) -> Result<()> {
        self.ctx.session().check_document(doc)?;
        let Some(description) = self.ctx.schema.field(field) else {
            return Err(GateError::Validation(format!(
                "field handle {field} does not exist ({} fields)",
                self.ctx.schema.len()
            )));
        };
        if description.kind != value.kind() {
            return Err(GateError::Validation(format!(
                "field '{}' is {:?}, cannot take {} via {}",
                description.name,
                description.kind,
                kind_name(value.kind()),
                value.method()
            )));
        }
        self.ctx.call(&Call::AddValue { field, doc, value })?;
        Ok(())
    }

    /// Create (or reopen) the index in `directory`
    pub fn create_index(&self, directory: impl AsRef<Path>) -> Result<Index> {
        self.create_at(IndexLocation::Directory(directory.as_ref().to_path_buf()))
    }

    /// Create the index in memory
    pub fn create_index_in_ram(&self) -> Result<Index> {
        self.create_at(IndexLocation::Ram)
    }

    /// Create the index at the session's storage path, or in RAM without one
    pub fn open_index(&self) -> Result<Index> {
        match self.ctx.session().storage_path() {
            Some(path) => self.create_at(IndexLocation::Directory(path.to_path_buf())),
            None => self.create_at(IndexLocation::Ram),
        }
    }

    fn create_at(&self, location: IndexLocation) -> Result<Index> {
        let session = self.ctx.session();
        if session.bind_index(&location)? {
            tracing::debug!("Session {} reuses its index at {:?}", session.id(), location);
            return Ok(Index::new(self.ctx.clone(), location));
        }

        let call = Call::CreateIndex {
            directory: location.directory(),
            memsize: self.ctx.stage.config.index.writer_memory_bytes,
        };
        if let Err(e) = self.ctx.call(&call).and_then(|payload| self.check_opened(&payload)) {
            session.unbind_index();
            return Err(e);
        }
        tracing::info!("Session {} created index at {:?}", session.id(), location);
        Ok(Index::new(self.ctx.clone(), location))
    }

    /// A reopened directory must carry the schema this session built
    fn check_opened(&self, payload: &serde_json::Value) -> Result<()> {
        let Some(opened) = decode::index_schema(payload)? else {
            return Ok(());
        };
        if opened != *self.ctx.schema {
            return Err(GateError::Validation(format!(
                "index schema [{}] does not match the session schema [{}]",
                field_list(&opened),
                field_list(&self.ctx.schema)
            )));
        }
        Ok(())
    }
}

fn field_list(schema: &SchemaDescription) -> String {
    schema
        .fields
        .iter()
        .map(|f| format!("{}:{:?}", f.name, f.kind))
        .collect::<Vec<_>>()
        .join(", ")
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Json => "json",
        FieldKind::Date => "a date",
        FieldKind::U64 => "u64",
        FieldKind::I64 => "i64",
        FieldKind::F64 => "f64",
        FieldKind::Other => "an unsupported value",
    }
}
