//! Wire protocol: request envelopes and typed calls
//!
//! Every operation travels as one JSON object:
//! `{ "id": <session>, "jpc": "1.0", "obj": <object>, "method": <method>, "params": {...} }`

pub mod call;
pub mod envelope;

pub use call::{Call, FieldValue, MAX_FUZZY_DISTANCE};
pub use envelope::{decode, encode, Request};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version string included in all requests
pub const PROTOCOL_VERSION: &str = "1.0";

/// Remote object a call is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    #[serde(rename = "builder")]
    Builder,
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "index")]
    Index,
    #[serde(rename = "indexwriter")]
    IndexWriter,
    #[serde(rename = "index_reader")]
    IndexReader,
    #[serde(rename = "query_parser")]
    QueryParser,
    #[serde(rename = "searcher")]
    Searcher,
    #[serde(rename = "schema")]
    Schema,
    #[serde(rename = "fuzzy_searcher")]
    FuzzySearcher,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Builder => "builder",
            ObjectKind::Document => "document",
            ObjectKind::Index => "index",
            ObjectKind::IndexWriter => "indexwriter",
            ObjectKind::IndexReader => "index_reader",
            ObjectKind::QueryParser => "query_parser",
            ObjectKind::Searcher => "searcher",
            ObjectKind::Schema => "schema",
            ObjectKind::FuzzySearcher => "fuzzy_searcher",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
