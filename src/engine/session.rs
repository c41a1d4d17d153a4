//! Per-session engine state and the write half of dispatch.
//!
//! Each session keeps at most one live object per stage; a newer
//! object of a stage replaces the older one.

use crate::core::protocol::{ObjectKind, Request};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::params::Params;
use serde_json::{json, Value};
use std::path::Path;
use tantivy::query::{Query, QueryParser};
use tantivy::schema::{
    DateOptions, Field, FieldType, IndexRecordOption, JsonObjectOptions, NumericOptions, Schema,
    SchemaBuilder, Term, TextFieldIndexing, TextOptions, Type,
};
use tantivy::{DateTime, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument};

/// Writer heap budget when `index.create` omits `memsize`
const DEFAULT_MEMSIZE: u64 = 50_000_000;

/// Reply of an overflowed call, kept for the retry of the same request
pub(crate) struct PendingReply {
    pub request: Vec<u8>,
    pub status: i64,
    pub body: Vec<u8>,
}

pub(crate) struct EngineSession {
    pub(crate) id: String,
    builder: Option<SchemaBuilder>,
    declared: Vec<String>,
    pub(crate) schema: Option<Schema>,
    /// In-progress documents; handle `n` is entry `n - 1`
    pub(crate) documents: Vec<TantivyDocument>,
    pub(crate) index: Option<Index>,
    memsize: usize,
    writer: Option<IndexWriter>,
    reader: Option<IndexReader>,
    pub(crate) searcher: Option<Searcher>,
    pub(crate) query_parser: Option<QueryParser>,
    pub(crate) query: Option<Box<dyn Query>>,
    pub(crate) fuzzy_query: Option<Box<dyn Query>>,
    pending: Option<PendingReply>,
}

impl EngineSession {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            builder: None,
            declared: Vec::new(),
            schema: None,
            documents: Vec::new(),
            index: None,
            memsize: DEFAULT_MEMSIZE as usize,
            writer: None,
            reader: None,
            searcher: None,
            query_parser: None,
            query: None,
            fuzzy_query: None,
            pending: None,
        }
    }

    /// Hand back a stashed reply if `request` repeats the overflowed one
    pub fn take_pending(&mut self, request: &[u8]) -> Option<PendingReply> {
        match self.pending.take() {
            Some(pending) if pending.request == request => Some(pending),
            _ => None,
        }
    }

    pub fn stash(&mut self, reply: PendingReply) {
        self.pending = Some(reply);
    }

    pub fn dispatch(&mut self, request: &Request) -> EngineResult<Value> {
        let params = Params::new(request);
        let method = request.method.as_str();
        match request.obj {
            ObjectKind::Builder => self.handle_builder(method, &params),
            ObjectKind::Document => self.handle_document(method, &params),
            ObjectKind::Index => self.handle_index(method, &params),
            ObjectKind::IndexWriter => self.handle_writer(method, &params),
            ObjectKind::IndexReader => self.handle_reader(method),
            ObjectKind::QueryParser => self.handle_query_parser(method, &params),
            ObjectKind::Searcher => self.handle_searcher(method, &params),
            ObjectKind::FuzzySearcher => self.handle_fuzzy_searcher(method, &params),
            ObjectKind::Schema => self.handle_schema(method, &params),
        }
    }

    pub(crate) fn schema(&self) -> EngineResult<&Schema> {
        self.schema
            .as_ref()
            .ok_or_else(|| EngineError::not_ready("schema not built"))
    }

    pub(crate) fn index(&self) -> EngineResult<&Index> {
        self.index
            .as_ref()
            .ok_or_else(|| EngineError::not_ready("index not created"))
    }

    /// Resolve a field id sent on the wire against the built schema
    pub(crate) fn field(&self, raw: u64) -> EngineResult<Field> {
        let schema = self.schema()?;
        let count = schema.fields().count() as u64;
        if raw >= count {
            return Err(EngineError::NotExist(format!(
                "field {raw} (schema has {count} fields)"
            )));
        }
        Ok(Field::from_field_id(raw as u32))
    }

    fn handle_builder(&mut self, method: &str, params: &Params<'_>) -> EngineResult<Value> {
        if self.schema.is_some() {
            return Err(EngineError::not_ready("schema already built"));
        }
        if method == "build" {
            let builder = self
                .builder
                .take()
                .ok_or_else(|| EngineError::not_ready("schema_builder not created"))?;
            let schema = builder.build();
            let reply = json!({ "schema": serde_json::to_value(&schema)? });
            tracing::debug!("Session {} built schema", self.id);
            self.schema = Some(schema);
            return Ok(reply);
        }

        let name = params.str("name")?;
        if self.declared.iter().any(|declared| declared == name) {
            return Err(EngineError::bad_params(format!(
                "field '{name}' already declared"
            )));
        }
        let stored = params.bool_or("stored", false)?;
        let indexed = params.bool_or("indexed", method == "add_text_field")?;
        let fast = params.bool_or("fast", false)?;

        let builder = self.builder.get_or_insert_with(Schema::builder);
        let field = match method {
            "add_text_field" => {
                let options = text_options(params, stored, indexed, fast)?;
                builder.add_text_field(name, options)
            }
            "add_json_field" => {
                let mut options = JsonObjectOptions::default();
                if stored {
                    options = options.set_stored();
                }
                if indexed {
                    let tokenizer = params.opt_str("tokenizer")?.unwrap_or("default");
                    options = options.set_indexing_options(
                        TextFieldIndexing::default()
                            .set_tokenizer(tokenizer)
                            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
                    );
                }
                if fast {
                    options = options.set_fast(None);
                }
                builder.add_json_field(name, options)
            }
            "add_date_field" => {
                let mut options = DateOptions::default();
                if stored {
                    options = options.set_stored();
                }
                if indexed {
                    options = options.set_indexed();
                }
                if fast {
                    options = options.set_fast();
                }
                builder.add_date_field(name, options)
            }
            "add_u64_field" => builder.add_u64_field(name, numeric_options(stored, indexed, fast)),
            "add_i64_field" => builder.add_i64_field(name, numeric_options(stored, indexed, fast)),
            "add_f64_field" => builder.add_f64_field(name, numeric_options(stored, indexed, fast)),
            other => return Err(EngineError::Unrecognized(format!("builder.{other}"))),
        };
        self.declared.push(name.to_string());
        Ok(json!({ "field": field.field_id() }))
    }

    fn handle_document(&mut self, method: &str, params: &Params<'_>) -> EngineResult<Value> {
        if method == "create" {
            self.documents.push(TantivyDocument::default());
            return Ok(json!({ "document_count": self.documents.len() }));
        }

        let field = self.field(params.u64("field")?)?;
        let value_type = self
            .schema()?
            .get_field_entry(field)
            .field_type()
            .value_type();
        let slot = self.document_slot(params.u64("doc_id")?)?;
        let expected = match method {
            "add_text" => Type::Str,
            "add_int" => Type::I64,
            "add_uint" => Type::U64,
            "add_f64" => Type::F64,
            "add_date" => Type::Date,
            other => return Err(EngineError::Unrecognized(format!("document.{other}"))),
        };
        if value_type != expected {
            return Err(EngineError::bad_params(format!(
                "{method} on a field of type {value_type:?}"
            )));
        }

        match expected {
            Type::Str => {
                let text = params.str("value")?;
                self.documents[slot].add_text(field, text);
            }
            Type::I64 => {
                let value = params.i64("value")?;
                self.documents[slot].add_i64(field, value);
            }
            Type::U64 => {
                let value = params.u64("value")?;
                self.documents[slot].add_u64(field, value);
            }
            Type::F64 => {
                let value = params.f64("value")?;
                self.documents[slot].add_f64(field, value);
            }
            _ => {
                let micros = params.i64("value")?;
                self.documents[slot].add_date(field, DateTime::from_timestamp_micros(micros));
            }
        }
        Ok(json!({}))
    }

    /// Vector slot of a 1-based document handle
    pub(crate) fn document_slot(&self, handle: u64) -> EngineResult<usize> {
        if handle == 0 || handle > self.documents.len() as u64 {
            return Err(EngineError::NotExist(format!(
                "document {handle} ({} created)",
                self.documents.len()
            )));
        }
        Ok(handle as usize - 1)
    }

    fn handle_index(&mut self, method: &str, params: &Params<'_>) -> EngineResult<Value> {
        match method {
            "create" => {
                if let Some(index) = &self.index {
                    return Ok(json!({ "schema": serde_json::to_value(index.schema())? }));
                }
                let schema = self.schema()?.clone();
                self.memsize = params.u64_or("memsize", DEFAULT_MEMSIZE)? as usize;
                let directory = params.opt_str("directory")?.unwrap_or("");
                let index = if directory.is_empty() {
                    tracing::debug!("Session {} creating index in RAM", self.id);
                    Index::create_in_ram(schema)
                } else {
                    open_or_create(Path::new(directory), schema)?
                };
                let schema = index.schema();
                let reply = json!({ "schema": serde_json::to_value(&schema)? });
                self.schema = Some(schema);
                self.index = Some(index);
                Ok(reply)
            }
            "reader_builder" => {
                let reader: IndexReader = self
                    .index()?
                    .reader_builder()
                    .reload_policy(ReloadPolicy::Manual)
                    .try_into()?;
                self.reader = Some(reader);
                Ok(json!({}))
            }
            other => Err(EngineError::Unrecognized(format!("index.{other}"))),
        }
    }

    /// The writer is opened on first use
    fn writer(&mut self) -> EngineResult<&mut IndexWriter> {
        if self.writer.is_none() {
            let writer = self.index()?.writer(self.memsize)?;
            self.writer = Some(writer);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| EngineError::not_ready("index writer unavailable"))
    }

    fn handle_writer(&mut self, method: &str, params: &Params<'_>) -> EngineResult<Value> {
        match method {
            "add_document" => {
                let slot = self.document_slot(params.u64("id")?)?;
                let document = self.documents[slot].clone();
                let opstamp = self.writer()?.add_document(document)?;
                Ok(json!({ "opstamp": opstamp }))
            }
            "delete_term" => {
                let term = self.delete_target(params.str("field")?, params)?;
                let opstamp = self.writer()?.delete_term(term);
                Ok(json!({ "opstamp": opstamp }))
            }
            "commit" => {
                let id = self.writer()?.commit()?;
                tracing::debug!("Session {} committed opstamp {}", self.id, id);
                Ok(json!({ "id": id }))
            }
            other => Err(EngineError::Unrecognized(format!("indexwriter.{other}"))),
        }
    }

    fn delete_target(&self, name: &str, params: &Params<'_>) -> EngineResult<Term> {
        let schema = self.schema()?;
        let field = schema.get_field(name)?;
        let raw = params.str("term")?;
        let unparsable =
            |kind: &str| EngineError::bad_params(format!("term '{raw}' is not a valid {kind}"));
        let term = match schema.get_field_entry(field).field_type() {
            FieldType::Str(_) => Term::from_field_text(field, raw),
            FieldType::I64(_) => {
                Term::from_field_i64(field, raw.parse().map_err(|_| unparsable("i64"))?)
            }
            FieldType::U64(_) => {
                Term::from_field_u64(field, raw.parse().map_err(|_| unparsable("u64"))?)
            }
            FieldType::F64(_) => {
                Term::from_field_f64(field, raw.parse().map_err(|_| unparsable("f64"))?)
            }
            other => {
                return Err(EngineError::bad_params(format!(
                    "cannot delete by term on a {:?} field",
                    other.value_type()
                )))
            }
        };
        Ok(term)
    }

    fn handle_reader(&mut self, method: &str) -> EngineResult<Value> {
        match method {
            "searcher" => {
                let reader = self
                    .reader
                    .as_ref()
                    .ok_or_else(|| EngineError::not_ready("reader not built"))?;
                self.searcher = Some(reader.searcher());
                self.query_parser = None;
                self.query = None;
                self.fuzzy_query = None;
                Ok(json!({}))
            }
            other => Err(EngineError::Unrecognized(format!("index_reader.{other}"))),
        }
    }
}

fn text_options(
    params: &Params<'_>,
    stored: bool,
    indexed: bool,
    fast: bool,
) -> EngineResult<TextOptions> {
    let (default_tokenizer, record) = match params.u64("type")? {
        1 => ("raw", IndexRecordOption::Basic),
        2 => ("default", IndexRecordOption::WithFreqsAndPositions),
        other => {
            return Err(EngineError::bad_params(format!(
                "text field type must be 1 (string) or 2 (text), got {other}"
            )))
        }
    };
    let tokenizer = params.opt_str("tokenizer")?.unwrap_or(default_tokenizer);

    let mut options = TextOptions::default();
    if indexed {
        options = options.set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(tokenizer)
                .set_index_option(record),
        );
    }
    if stored {
        options = options.set_stored();
    }
    if fast {
        options = options.set_fast(None);
    }
    Ok(options)
}

fn numeric_options(stored: bool, indexed: bool, fast: bool) -> NumericOptions {
    let mut options = NumericOptions::default();
    if stored {
        options = options.set_stored();
    }
    if indexed {
        options = options.set_indexed();
    }
    if fast {
        options = options.set_fast();
    }
    options
}

/// Reopen an existing index directory or create a fresh one
fn open_or_create(directory: &Path, schema: Schema) -> EngineResult<Index> {
    if directory.join("meta.json").exists() {
        tracing::debug!("Opening existing index at {}", directory.display());
        return Ok(Index::open_in_dir(directory)?);
    }
    std::fs::create_dir_all(directory)?;
    tracing::debug!("Creating index at {}", directory.display());
    Ok(Index::create_in_dir(directory, schema)?)
}
