//! Read half of dispatch: query parsing, searching, schema introspection.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::params::Params;
use crate::engine::session::EngineSession;
use serde_json::{json, Map, Value};
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{FuzzyTermQuery, Query, QueryParser};
use tantivy::schema::{Field, FieldType, Schema, Term};
use tantivy::snippet::SnippetGenerator;
use tantivy::{DocAddress, Document, Score, Searcher, TantivyDocument};

/// Result window of one search call
struct Window {
    scoring: bool,
    /// Zero means every match
    top_limit: u64,
    offset: u64,
}

impl Window {
    fn from_params(params: &Params<'_>) -> EngineResult<Self> {
        Ok(Self {
            scoring: params.bool_or("scoring", true)?,
            top_limit: params.u64_or("top_limit", 0)?,
            offset: params.u64_or("offset", 0)?,
        })
    }

    /// Every match in address order, unscored
    fn unbounded() -> Self {
        Self {
            scoring: false,
            top_limit: 0,
            offset: 0,
        }
    }
}

impl EngineSession {
    pub(crate) fn handle_query_parser(
        &mut self,
        method: &str,
        params: &Params<'_>,
    ) -> EngineResult<Value> {
        match method {
            "for_index" => {
                let schema = self.schema()?;
                let fields = params
                    .str_list("fields")?
                    .into_iter()
                    .map(|name| schema.get_field(name).map_err(EngineError::from))
                    .collect::<EngineResult<Vec<Field>>>()?;
                let parser = QueryParser::for_index(self.index()?, fields);
                self.query_parser = Some(parser);
                Ok(json!({}))
            }
            "parse_query" => {
                let text = params.str("query")?;
                let query = match &self.query_parser {
                    Some(parser) => parser.parse_query(text)?,
                    None => self.default_parser()?.parse_query(text)?,
                };
                self.query = Some(query);
                Ok(json!({}))
            }
            "parse_fuzzy_query" => {
                let schema = self.schema()?;
                let field = schema.get_field(params.single_str("field")?)?;
                if !matches!(schema.get_field_entry(field).field_type(), FieldType::Str(_)) {
                    return Err(EngineError::bad_params(
                        "fuzzy queries need a text field",
                    ));
                }
                let term = Term::from_field_text(field, params.single_str("term")?);
                let distance = params.u64_or("distance", 1)?;
                if distance > 2 {
                    return Err(EngineError::bad_params(format!(
                        "fuzzy distance {distance} exceeds 2"
                    )));
                }
                self.fuzzy_query = Some(Box::new(FuzzyTermQuery::new(
                    term,
                    distance as u8,
                    true,
                )));
                Ok(json!({}))
            }
            other => Err(EngineError::Unrecognized(format!("query_parser.{other}"))),
        }
    }

    /// Parser over every indexed text field, used until `for_index` runs
    fn default_parser(&self) -> EngineResult<QueryParser> {
        let schema = self.schema()?;
        let fields = schema
            .fields()
            .filter(|(_, entry)| {
                matches!(entry.field_type(), FieldType::Str(_)) && entry.is_indexed()
            })
            .map(|(field, _)| field)
            .collect();
        Ok(QueryParser::for_index(self.index()?, fields))
    }

    fn leased(&self) -> EngineResult<&Searcher> {
        self.searcher
            .as_ref()
            .ok_or_else(|| EngineError::not_ready("searcher not leased"))
    }

    fn parsed_query(&self) -> EngineResult<&dyn Query> {
        self.query
            .as_deref()
            .ok_or_else(|| EngineError::not_ready("no query parsed"))
    }

    pub(crate) fn handle_searcher(
        &mut self,
        method: &str,
        params: &Params<'_>,
    ) -> EngineResult<Value> {
        let searcher = self.leased()?;
        let query = self.parsed_query()?;
        let schema = self.schema()?;

        match method {
            "search" | "search_raw" => {
                let (window, explain, snippet_fields) = if method == "search" {
                    (
                        Window::from_params(params)?,
                        params.bool_or("explain", false)?,
                        params.opt_str_list("snippet_field")?,
                    )
                } else {
                    (Window::unbounded(), false, Vec::new())
                };
                let generators = snippet_generators(searcher, schema, query, &snippet_fields)?;
                let hits = collect(searcher, query, &window)?
                    .into_iter()
                    .map(|(score, address)| {
                        render_hit(searcher, schema, query, address, score, explain, &generators)
                    })
                    .collect::<EngineResult<Vec<Value>>>()?;
                tracing::debug!("Session {} search matched {} hits", self.id, hits.len());
                Ok(json!({ "hits": hits }))
            }
            "docset" => {
                let window = Window::from_params(params)?;
                let docset: Vec<Value> = collect(searcher, query, &window)?
                    .into_iter()
                    .map(|(score, address)| {
                        let mut entry = json!({
                            "doc_id": address.doc_id,
                            "segment_ord": address.segment_ord,
                        });
                        if let Some(score) = score {
                            entry["score"] = json!(score);
                        }
                        entry
                    })
                    .collect();
                Ok(json!({ "docset": docset }))
            }
            "get_document" => {
                let segment_ord = params.u64("segment_ord")?;
                let doc_id = params.u64("doc_id")?;
                let address = checked_address(searcher, segment_ord, doc_id)?;
                let score = params.opt_f64("score")?.map(|s| s as Score);
                let snippet_fields = params.opt_str_list("snippet_field")?;
                let generators = snippet_generators(searcher, schema, query, &snippet_fields)?;
                let hit = render_hit(
                    searcher,
                    schema,
                    query,
                    address,
                    score,
                    params.bool_or("explain", false)?,
                    &generators,
                )?;
                Ok(json!({ "hit": hit }))
            }
            "snippet" => {
                let field = self.field(params.u64("field")?)?;
                let generator = SnippetGenerator::create(searcher, query, field)?;
                let snippets = params
                    .u64_list("doc_ids")?
                    .into_iter()
                    .map(|handle| {
                        let slot = self.document_slot(handle)?;
                        let snippet = generator.snippet_from_doc(&self.documents[slot]);
                        Ok(json!({
                            "doc_id": handle,
                            "fragment": snippet.fragment(),
                            "html": snippet.to_html(),
                        }))
                    })
                    .collect::<EngineResult<Vec<Value>>>()?;
                Ok(json!({ "snippets": snippets }))
            }
            other => Err(EngineError::Unrecognized(format!("searcher.{other}"))),
        }
    }

    pub(crate) fn handle_fuzzy_searcher(
        &mut self,
        method: &str,
        params: &Params<'_>,
    ) -> EngineResult<Value> {
        if method != "fuzzy_searcher" {
            return Err(EngineError::Unrecognized(format!("fuzzy_searcher.{method}")));
        }
        let searcher = self.leased()?;
        let schema = self.schema()?;
        let query = self
            .fuzzy_query
            .as_deref()
            .ok_or_else(|| EngineError::not_ready("no fuzzy query parsed"))?;
        let window = Window {
            scoring: true,
            top_limit: params.u64_or("top_limit", 0)?,
            offset: 0,
        };
        let hits = collect(searcher, query, &window)?
            .into_iter()
            .map(|(score, address)| render_hit(searcher, schema, query, address, score, false, &[]))
            .collect::<EngineResult<Vec<Value>>>()?;
        Ok(json!({ "hits": hits }))
    }

    pub(crate) fn handle_schema(
        &mut self,
        method: &str,
        params: &Params<'_>,
    ) -> EngineResult<Value> {
        let schema = self.schema()?;
        match method {
            "get_field_entry" => {
                let field = schema.get_field(params.single_str("field")?)?;
                Ok(json!({ "entry": serde_json::to_value(schema.get_field_entry(field))? }))
            }
            "get_field_name" => {
                let field = self.field(params.u64("field_id")?)?;
                Ok(json!({ "name": schema.get_field_name(field) }))
            }
            "num_fields" => Ok(json!({ "num_fields": schema.fields().count() })),
            "fields" => {
                let names: Vec<&str> = schema.fields().map(|(_, entry)| entry.name()).collect();
                Ok(json!({ "fields": names }))
            }
            "get_field" => {
                let field = schema.get_field(params.single_str("field")?)?;
                Ok(json!({ "field": field.field_id() }))
            }
            other => Err(EngineError::Unrecognized(format!("schema.{other}"))),
        }
    }
}

/// Matching addresses, ranked when scoring and in address order otherwise
fn collect(
    searcher: &Searcher,
    query: &dyn Query,
    window: &Window,
) -> EngineResult<Vec<(Option<Score>, DocAddress)>> {
    let offset = window.offset as usize;
    if window.scoring {
        let limit = match window.top_limit {
            0 => (searcher.num_docs() as usize).max(1),
            n => n as usize,
        };
        let top = searcher.search(query, &TopDocs::with_limit(limit).and_offset(offset))?;
        return Ok(top
            .into_iter()
            .map(|(score, address)| (Some(score), address))
            .collect());
    }

    let mut addresses: Vec<DocAddress> = searcher
        .search(query, &DocSetCollector)?
        .into_iter()
        .collect();
    addresses.sort_by_key(|address| (address.segment_ord, address.doc_id));
    let take = match window.top_limit {
        0 => usize::MAX,
        n => n as usize,
    };
    Ok(addresses
        .into_iter()
        .skip(offset)
        .take(take)
        .map(|address| (None, address))
        .collect())
}

fn checked_address(searcher: &Searcher, segment_ord: u64, doc_id: u64) -> EngineResult<DocAddress> {
    let segments = searcher.segment_readers();
    let Some(segment) = segments.get(segment_ord as usize) else {
        return Err(EngineError::NotExist(format!(
            "segment {segment_ord} ({} segments)",
            segments.len()
        )));
    };
    if doc_id >= u64::from(segment.max_doc()) {
        return Err(EngineError::NotExist(format!(
            "document {doc_id} in segment {segment_ord}"
        )));
    }
    Ok(DocAddress::new(segment_ord as u32, doc_id as u32))
}

fn snippet_generators(
    searcher: &Searcher,
    schema: &Schema,
    query: &dyn Query,
    names: &[&str],
) -> EngineResult<Vec<(String, SnippetGenerator)>> {
    names
        .iter()
        .map(|name| {
            let field = schema.get_field(name)?;
            let generator = SnippetGenerator::create(searcher, query, field)?;
            Ok((name.to_string(), generator))
        })
        .collect()
}

fn render_hit(
    searcher: &Searcher,
    schema: &Schema,
    query: &dyn Query,
    address: DocAddress,
    score: Option<Score>,
    explain: bool,
    generators: &[(String, SnippetGenerator)],
) -> EngineResult<Value> {
    let doc: TantivyDocument = searcher.doc(address)?;
    let mut hit = Map::new();
    hit.insert(
        "doc".to_string(),
        serde_json::to_value(doc.to_named_doc(schema))?,
    );
    if let Some(score) = score {
        hit.insert("score".to_string(), json!(score));
    }
    if explain {
        let explanation = query.explain(searcher, address)?;
        hit.insert("explain".to_string(), serde_json::to_value(&explanation)?);
    }
    if !generators.is_empty() {
        let snippets: Map<String, Value> = generators
            .iter()
            .map(|(name, generator)| (name.clone(), json!(generator.snippet_from_doc(&doc).to_html())))
            .collect();
        hit.insert("snippets".to_string(), Value::Object(snippets));
    }
    Ok(Value::Object(hit))
}
