//! One typed request builder per wire method.
//!
//! Every variant fixes the parameter list of a single `obj.method`
//! pair, so the loosely typed params map only exists after
//! validation, at encode time.

use crate::core::error::{GateError, Result};
use crate::core::protocol::ObjectKind;
use crate::core::types::{
    DocHandle, DocsetEntry, FieldHandle, FieldKind, FieldSpec, SearchOptions, TopLimit,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::path::Path;

/// Highest edit distance the engine accepts for fuzzy terms
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// A value attached to an in-progress document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    I64(i64),
    U64(u64),
    F64(f64),
    Date(DateTime<Utc>),
}

impl FieldValue<'_> {
    /// Document method carrying this value
    pub fn method(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "add_text",
            FieldValue::I64(_) => "add_int",
            FieldValue::U64(_) => "add_uint",
            FieldValue::F64(_) => "add_f64",
            FieldValue::Date(_) => "add_date",
        }
    }

    /// Field kind the value may be attached to
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::I64(_) => FieldKind::I64,
            FieldValue::U64(_) => FieldKind::U64,
            FieldValue::F64(_) => FieldKind::F64,
            FieldValue::Date(_) => FieldKind::Date,
        }
    }

    fn to_wire(self) -> Value {
        match self {
            FieldValue::Text(s) => json!(s),
            FieldValue::I64(v) => json!(v),
            FieldValue::U64(v) => json!(v),
            FieldValue::F64(v) => json!(v),
            FieldValue::Date(d) => json!(d.timestamp_micros()),
        }
    }
}

/// A single remote operation with its typed parameters
#[derive(Debug, Clone)]
pub enum Call<'a> {
    AddField(&'a FieldSpec),
    BuildSchema,
    CreateDocument,
    AddValue {
        field: FieldHandle,
        doc: DocHandle,
        value: FieldValue<'a>,
    },
    /// `None` directory creates the index in RAM
    CreateIndex {
        directory: Option<&'a Path>,
        memsize: usize,
    },
    ReaderBuilder,
    LeaseSearcher,
    AddDocument(DocHandle),
    DeleteTerm {
        field: &'a str,
        term: &'a str,
    },
    Commit,
    ForIndex(&'a [&'a str]),
    ParseQuery(&'a str),
    ParseFuzzyQuery {
        field: &'a str,
        term: &'a str,
        distance: u8,
    },
    Search(&'a SearchOptions),
    SearchRaw,
    Docset {
        scoring: bool,
        top_limit: TopLimit,
        offset: u64,
    },
    GetDocument {
        entry: &'a DocsetEntry,
        explain: bool,
        snippet_fields: &'a [String],
    },
    Snippet {
        field: FieldHandle,
        docs: &'a [DocHandle],
    },
    FuzzySearch(TopLimit),
    GetFieldEntry(&'a str),
    GetFieldName(FieldHandle),
    NumFields,
    Fields,
    GetField(&'a str),
}

impl Call<'_> {
    /// Remote object addressed by this call
    pub fn object(&self) -> ObjectKind {
        match self {
            Call::AddField(_) | Call::BuildSchema => ObjectKind::Builder,
            Call::CreateDocument | Call::AddValue { .. } => ObjectKind::Document,
            Call::CreateIndex { .. } | Call::ReaderBuilder => ObjectKind::Index,
            Call::LeaseSearcher => ObjectKind::IndexReader,
            Call::AddDocument(_) | Call::DeleteTerm { .. } | Call::Commit => {
                ObjectKind::IndexWriter
            }
            Call::ForIndex(_) | Call::ParseQuery(_) | Call::ParseFuzzyQuery { .. } => {
                ObjectKind::QueryParser
            }
            Call::Search(_)
            | Call::SearchRaw
            | Call::Docset { .. }
            | Call::GetDocument { .. }
            | Call::Snippet { .. } => ObjectKind::Searcher,
            Call::FuzzySearch(_) => ObjectKind::FuzzySearcher,
            Call::GetFieldEntry(_)
            | Call::GetFieldName(_)
            | Call::NumFields
            | Call::Fields
            | Call::GetField(_) => ObjectKind::Schema,
        }
    }

    /// Wire method name
    pub fn method(&self) -> &'static str {
        match self {
            Call::AddField(spec) => spec.kind.builder_method().unwrap_or("add_field"),
            Call::BuildSchema => "build",
            Call::CreateDocument => "create",
            Call::AddValue { value, .. } => value.method(),
            Call::CreateIndex { .. } => "create",
            Call::ReaderBuilder => "reader_builder",
            Call::LeaseSearcher => "searcher",
            Call::AddDocument(_) => "add_document",
            Call::DeleteTerm { .. } => "delete_term",
            Call::Commit => "commit",
            Call::ForIndex(_) => "for_index",
            Call::ParseQuery(_) => "parse_query",
            Call::ParseFuzzyQuery { .. } => "parse_fuzzy_query",
            Call::Search(_) => "search",
            Call::SearchRaw => "search_raw",
            Call::Docset { .. } => "docset",
            Call::GetDocument { .. } => "get_document",
            Call::Snippet { .. } => "snippet",
            Call::FuzzySearch(_) => "fuzzy_searcher",
            Call::GetFieldEntry(_) => "get_field_entry",
            Call::GetFieldName(_) => "get_field_name",
            Call::NumFields => "num_fields",
            Call::Fields => "fields",
            Call::GetField(_) => "get_field",
        }
    }

    /// Reject malformed parameters before anything is sent
    pub fn validate(&self) -> Result<()> {
        match self {
            Call::AddField(spec) => {
                non_empty("field name", &spec.name)?;
                if spec.kind == FieldKind::Other {
                    return invalid(format!(
                        "field '{}' has no builder method for its kind",
                        spec.name
                    ));
                }
                if let Some(tokenizer) = &spec.options.tokenizer {
                    non_empty("tokenizer", tokenizer)?;
                }
                Ok(())
            }
            Call::AddValue { doc, value, .. } => {
                if doc.0 == 0 {
                    return invalid("document handles start at 1");
                }
                if let FieldValue::F64(v) = value {
                    if !v.is_finite() {
                        return invalid(format!("f64 value must be finite, got {v}"));
                    }
                }
                Ok(())
            }
            Call::CreateIndex { directory, memsize } => {
                if *memsize == 0 {
                    return invalid("writer memory budget must be non-zero");
                }
                if let Some(dir) = directory {
                    match dir.to_str() {
                        Some(s) if !s.is_empty() => {}
                        Some(_) => return invalid("index directory must not be empty"),
                        None => {
                            return invalid(format!(
                                "index directory is not valid UTF-8: {}",
                                dir.display()
                            ))
                        }
                    }
                }
                Ok(())
            }
            Call::AddDocument(doc) => {
                if doc.0 == 0 {
                    return invalid("document handles start at 1");
                }
                Ok(())
            }
            Call::DeleteTerm { field, term } => {
                non_empty("field name", field)?;
                non_empty("term", term)
            }
            Call::ForIndex(fields) => {
                if fields.is_empty() {
                    return invalid("for_index needs at least one field");
                }
                fields.iter().try_for_each(|f| non_empty("field name", f))
            }
            Call::ParseQuery(query) => non_empty("query", query),
            Call::ParseFuzzyQuery {
                field,
                term,
                distance,
            } => {
                non_empty("field name", field)?;
                non_empty("term", term)?;
                if *distance > MAX_FUZZY_DISTANCE {
                    return invalid(format!(
                        "fuzzy distance {distance} exceeds {MAX_FUZZY_DISTANCE}"
                    ));
                }
                Ok(())
            }
            Call::Search(options) => options
                .snippet_fields
                .iter()
                .try_for_each(|f| non_empty("snippet field", f)),
            Call::GetDocument {
                entry,
                snippet_fields,
                ..
            } => {
                if let Some(score) = entry.score {
                    if !score.is_finite() {
                        return invalid(format!("score must be finite, got {score}"));
                    }
                }
                snippet_fields
                    .iter()
                    .try_for_each(|f| non_empty("snippet field", f))
            }
            Call::Snippet { docs, .. } => {
                if docs.is_empty() {
                    return invalid("snippet needs at least one document");
                }
                if docs.iter().any(|d| d.0 == 0) {
                    return invalid("document handles start at 1");
                }
                Ok(())
            }
            Call::GetFieldEntry(name) | Call::GetField(name) => non_empty("field name", name),
            Call::BuildSchema
            | Call::CreateDocument
            | Call::ReaderBuilder
            | Call::LeaseSearcher
            | Call::Commit
            | Call::SearchRaw
            | Call::Docset { .. }
            | Call::FuzzySearch(_)
            | Call::GetFieldName(_)
            | Call::NumFields
            | Call::Fields => Ok(()),
        }
    }

    /// Method-specific params map
    pub fn params(&self, session_id: &str) -> Map<String, Value> {
        let value = match self {
            Call::AddField(spec) => {
                let mut params = json!({
                    "name": spec.name,
                    "type": spec.storage_kind() as u8,
                    "stored": spec.options.stored,
                    "indexed": spec.options.indexed,
                    "fast": spec.options.fast,
                    "id": session_id,
                });
                if let Some(tokenizer) = &spec.options.tokenizer {
                    params["tokenizer"] = json!(tokenizer);
                }
                params
            }
            Call::AddValue { field, doc, value } => json!({
                "field": field.0,
                "value": value.to_wire(),
                "id": session_id,
                "doc_id": doc.0,
            }),
            Call::CreateIndex { directory, memsize } => json!({
                "directory": directory.and_then(Path::to_str).unwrap_or(""),
                "memsize": memsize,
            }),
            Call::AddDocument(doc) => json!({ "id": doc.0 }),
            Call::DeleteTerm { field, term } => json!({ "field": field, "term": term }),
            Call::ForIndex(fields) => json!({ "fields": fields }),
            Call::ParseQuery(query) => json!({ "query": query }),
            Call::ParseFuzzyQuery {
                field,
                term,
                distance,
            } => json!({
                "field": [field],
                "term": [term],
                "distance": distance,
            }),
            Call::Search(options) => json!({
                "explain": options.explain,
                "top_limit": options.top_limit.wire_value(),
                "offset": options.offset,
                "scoring": options.scoring,
                "snippet_field": options.snippet_fields,
            }),
            Call::Docset {
                scoring,
                top_limit,
                offset,
            } => json!({
                "scoring": scoring,
                "top_limit": top_limit.wire_value(),
                "offset": offset,
            }),
            Call::GetDocument {
                entry,
                explain,
                snippet_fields,
            } => {
                let mut params = json!({
                    "segment_ord": entry.segment_ord,
                    "doc_id": entry.doc_id,
                    "explain": explain,
                    "snippet_field": snippet_fields,
                });
                if let Some(score) = entry.score {
                    params["score"] = json!(score);
                }
                params
            }
            Call::Snippet { field, docs } => json!({
                "field": field.0,
                "doc_ids": docs.iter().map(|d| d.0).collect::<Vec<_>>(),
            }),
            Call::FuzzySearch(top_limit) => json!({ "top_limit": top_limit.wire_value() }),
            Call::GetFieldEntry(name) | Call::GetField(name) => json!({ "field": [name] }),
            Call::GetFieldName(field) => json!({ "field_id": field.0 }),
            Call::BuildSchema
            | Call::CreateDocument
            | Call::ReaderBuilder
            | Call::LeaseSearcher
            | Call::Commit
            | Call::SearchRaw
            | Call::NumFields
            | Call::Fields => json!({}),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T> {
    Err(GateError::Validation(message.into()))
}

fn non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return invalid(format!("{what} must not be empty"));
    }
    Ok(())
}
