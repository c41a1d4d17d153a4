//! Typed extraction of response payloads.
//!
//! Each function names the key it expects, so a malformed reply
//! surfaces as a decode error that says what was missing.

use crate::core::error::{GateError, Result};
use crate::core::types::{
    CommitId, DocHandle, DocsetEntry, FieldDescription, FieldHandle, Hit, Opstamp,
    SchemaDescription, Snippet,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

fn require<'a>(method: &str, payload: &'a Value, key: &str) -> Result<&'a Value> {
    payload.get(key).ok_or_else(|| {
        let detail = match payload {
            Value::Object(map) if map.is_empty() => "empty object".to_string(),
            Value::Object(map) => format!(
                "got keys {}",
                map.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
            Value::Null => "empty payload".to_string(),
            other => format!("got {}", type_name(other)),
        };
        GateError::decode(method, key, detail)
    })
}

fn require_u64(method: &str, payload: &Value, key: &str) -> Result<u64> {
    let value = require(method, payload, key)?;
    value.as_u64().ok_or_else(|| {
        GateError::decode(
            method,
            key,
            format!("expected unsigned integer, got {}", type_name(value)),
        )
    })
}

/// Deserialize `payload[key]`, or the payload itself when `bare` accepts it
fn typed<T: DeserializeOwned>(
    method: &str,
    payload: &Value,
    key: &str,
    bare: impl Fn(&Value) -> bool,
) -> Result<T> {
    let value = match payload.get(key) {
        Some(value) => value,
        None if bare(payload) => payload,
        None => require(method, payload, key)?,
    };
    T::deserialize(value).map_err(|e| GateError::decode(method, key, e.to_string()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `{"field": n}` from the field-add methods and `schema.get_field`
pub fn field_handle(method: &str, payload: &Value) -> Result<FieldHandle> {
    let raw = require_u64(method, payload, "field")?;
    u32::try_from(raw)
        .map(FieldHandle)
        .map_err(|_| GateError::decode(method, "field", format!("{raw} out of range")))
}

/// `{"document_count": n}`, the new document's handle
pub fn document_count(payload: &Value) -> Result<DocHandle> {
    require_u64("create", payload, "document_count").map(DocHandle)
}

/// `{"opstamp": n}` from `add_document` and `delete_term`
pub fn opstamp(method: &str, payload: &Value) -> Result<Opstamp> {
    require_u64(method, payload, "opstamp").map(Opstamp)
}

/// `{"id": n}` from `commit`
pub fn commit_id(payload: &Value) -> Result<CommitId> {
    require_u64("commit", payload, "id").map(CommitId)
}

/// `{"schema": [...]}`: the engine's field entries in handle order
pub fn schema(payload: &Value) -> Result<SchemaDescription> {
    schema_entries("build", require("build", payload, "schema")?)
}

/// Optional `{"schema": [...]}` from `index.create`, the schema the index was opened with
pub fn index_schema(payload: &Value) -> Result<Option<SchemaDescription>> {
    match payload.get("schema") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => schema_entries("create", value).map(Some),
    }
}

fn schema_entries(method: &str, value: &Value) -> Result<SchemaDescription> {
    let entries = match value {
        Value::Object(map) => map.get("fields").unwrap_or(value),
        _ => value,
    };
    let fields: Vec<FieldDescription> = Vec::deserialize(entries)
        .map_err(|e| GateError::decode(method, "schema", e.to_string()))?;
    Ok(SchemaDescription { fields })
}

/// `{"hits": [...]}` or a bare array of hits
pub fn hits(method: &str, payload: &Value) -> Result<Vec<Hit>> {
    typed(method, payload, "hits", Value::is_array)
}

/// `{"hit": {...}}` or a bare hit object
pub fn hit(payload: &Value) -> Result<Hit> {
    typed("get_document", payload, "hit", |v| v.get("doc").is_some())
}

/// `{"docset": [...]}` or a bare array of addresses
pub fn docset(payload: &Value) -> Result<Vec<DocsetEntry>> {
    typed("docset", payload, "docset", Value::is_array)
}

/// `{"snippets": [...]}` or a bare array
pub fn snippets(payload: &Value) -> Result<Vec<Snippet>> {
    typed("snippet", payload, "snippets", Value::is_array)
}

/// `{"num_fields": n}` or a bare number
pub fn num_fields(payload: &Value) -> Result<u64> {
    if let Some(n) = payload.as_u64() {
        return Ok(n);
    }
    require_u64("num_fields", payload, "num_fields")
}

/// `{"fields": [...]}`: field names in handle order
pub fn field_names(payload: &Value) -> Result<Vec<String>> {
    typed("fields", payload, "fields", |_| false)
}

/// `{"entry": {...}}`: the engine's full description of one field
pub fn field_entry(payload: &Value) -> Result<Value> {
    require("get_field_entry", payload, "entry").cloned()
}

/// `{"name": "..."}` from `get_field_name`
pub fn field_name(payload: &Value) -> Result<String> {
    typed("get_field_name", payload, "name", |_| false)
}
