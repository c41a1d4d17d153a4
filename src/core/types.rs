//! Core data types for the searchgate client.
//!
//! Handles, field descriptors, search options and the decoded result
//! shapes shared by the capability chain and the decoder.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Positional identifier of a schema field (declaration order, from 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldHandle(pub u32);

/// Per-session identifier of an in-progress document (from 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocHandle(pub u64);

/// Per-writer sequence number of a mutating operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opstamp(pub u64);

/// Durable checkpoint returned by a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub u64);

macro_rules! impl_handle_display {
    ($($handle:ident),*) => {
        $(
            impl fmt::Display for $handle {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_handle_display!(FieldHandle, DocHandle, Opstamp, CommitId);

/// Value type of a schema field, as reported by the engine's schema payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    #[serde(rename = "json_object")]
    Json,
    Date,
    U64,
    I64,
    F64,
    #[serde(other)]
    Other,
}

impl FieldKind {
    /// Builder method that declares a field of this kind
    pub fn builder_method(&self) -> Option<&'static str> {
        match self {
            FieldKind::Text => Some("add_text_field"),
            FieldKind::Json => Some("add_json_field"),
            FieldKind::Date => Some("add_date_field"),
            FieldKind::U64 => Some("add_u64_field"),
            FieldKind::I64 => Some("add_i64_field"),
            FieldKind::F64 => Some("add_f64_field"),
            FieldKind::Other => None,
        }
    }
}

/// How a text or JSON field is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextIndexing {
    /// Whole value is one token (wire type 1)
    Raw,
    /// Value runs through a tokenizer (wire type 2)
    #[default]
    Tokenized,
}

/// Wire `type` code sent with every field declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageKind {
    String = 1,
    Text = 2,
    Int = 3,
    UInt = 4,
    Json = 5,
    Float = 6,
    Date = 7,
}

/// Flags accepted by every field-add call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldOptions {
    pub stored: bool,
    pub indexed: bool,
    pub fast: bool,
    /// Tokenizer name; `None` means the engine default
    pub tokenizer: Option<String>,
    pub indexing: TextIndexing,
}

impl FieldOptions {
    /// Stored and indexed, engine default tokenizer
    pub fn stored_indexed() -> Self {
        Self {
            stored: true,
            indexed: true,
            ..Self::default()
        }
    }

    pub fn stored() -> Self {
        Self {
            stored: true,
            ..Self::default()
        }
    }

    pub fn with_fast(mut self) -> Self {
        self.fast = true;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Into<String>) -> Self {
        self.tokenizer = Some(tokenizer.into());
        self
    }

    /// Index the whole value as a single token
    pub fn raw(mut self) -> Self {
        self.indexing = TextIndexing::Raw;
        self
    }
}

/// One field declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub options: FieldOptions,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind, options: FieldOptions) -> Self {
        Self {
            name: name.into(),
            kind,
            options,
        }
    }

    /// Wire `type` code for this declaration
    pub fn storage_kind(&self) -> StorageKind {
        match (self.kind, self.options.indexing) {
            (FieldKind::Text, TextIndexing::Raw) => StorageKind::String,
            (FieldKind::Text, TextIndexing::Tokenized) => StorageKind::Text,
            (FieldKind::Json, _) => StorageKind::Json,
            (FieldKind::I64, _) => StorageKind::Int,
            (FieldKind::U64, _) => StorageKind::UInt,
            (FieldKind::F64, _) => StorageKind::Float,
            (FieldKind::Date, _) => StorageKind::Date,
            (FieldKind::Other, _) => StorageKind::Text,
        }
    }
}

/// One entry of a built schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
}

/// Finalized field list; handle `i` is entry `i`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDescription {
    pub fields: Vec<FieldDescription>,
}

impl SchemaDescription {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, handle: FieldHandle) -> Option<&FieldDescription> {
        self.fields.get(handle.0 as usize)
    }

    pub fn handle_of(&self, name: &str) -> Option<FieldHandle> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| FieldHandle(i as u32))
    }
}

/// Result cap for search calls
///
/// Always sent explicitly; zero on the wire means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopLimit {
    #[default]
    Unbounded,
    Top(u64),
}

impl TopLimit {
    pub fn wire_value(&self) -> u64 {
        match self {
            TopLimit::Unbounded => 0,
            TopLimit::Top(n) => *n,
        }
    }
}

impl From<u64> for TopLimit {
    fn from(n: u64) -> Self {
        if n == 0 {
            TopLimit::Unbounded
        } else {
            TopLimit::Top(n)
        }
    }
}

/// Parameters of a ranked search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub explain: bool,
    pub top_limit: TopLimit,
    pub offset: u64,
    /// Rank by relevance and report scores
    pub scoring: bool,
    pub snippet_fields: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            explain: false,
            top_limit: TopLimit::Unbounded,
            offset: 0,
            scoring: true,
            snippet_fields: Vec::new(),
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: impl Into<TopLimit>) -> Self {
        self.top_limit = limit.into();
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn explained(mut self) -> Self {
        self.explain = true;
        self
    }

    pub fn unscored(mut self) -> Self {
        self.scoring = false;
        self
    }

    pub fn with_snippets<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.snippet_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// One search result with its stored fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Stored values keyed by field name
    pub doc: BTreeMap<String, Vec<Value>>,

    /// Relevance score (present only for scored searches)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    #[serde(
        default,
        rename = "explain",
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<Value>,

    /// Highlighted excerpts keyed by field name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub snippets: BTreeMap<String, String>,
}

impl Hit {
    pub fn values(&self, field: &str) -> &[Value] {
        self.doc.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_text(&self, field: &str) -> Option<&str> {
        self.values(field).first().and_then(Value::as_str)
    }

    pub fn first_i64(&self, field: &str) -> Option<i64> {
        self.values(field).first().and_then(Value::as_i64)
    }

    pub fn first_u64(&self, field: &str) -> Option<u64> {
        self.values(field).first().and_then(Value::as_u64)
    }
}

/// Lightweight result address, hydrated later with `get_document`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocsetEntry {
    pub doc_id: u32,
    pub segment_ord: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Highlighted excerpt for an in-progress document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub doc_id: DocHandle,
    pub fragment: String,
    pub html: String,
}

/// Ranking constants (term saturation and length normalization)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingParams {
    pub k1: f32,
    pub b: f32,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}
