// Integration tests for schema introspection

use crate::common::{embedded_client, Library};
use searchgate::{FieldHandle, FieldKind, FieldOptions};

#[test]
fn test_description_matches_declarations() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let schema = library.index.schema();
    let description = schema.description();

    assert_eq!(description.len(), 3);
    assert_eq!(description.handle_of("body"), Some(FieldHandle(1)));
    assert_eq!(description.field(FieldHandle(2)).unwrap().kind, FieldKind::I64);
    assert_eq!(description.field(FieldHandle(0)).unwrap().name, "title");
}

#[test]
fn test_engine_schema_queries() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let schema = library.index.schema();

    assert_eq!(schema.num_fields().unwrap(), 3);
    assert_eq!(schema.fields().unwrap(), vec!["title", "body", "order"]);
    assert_eq!(schema.get_field("order").unwrap(), library.order);
    assert_eq!(schema.get_field_name(library.body).unwrap(), "body");
}

#[test]
fn test_field_entry_describes_options() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let entry = library.index.schema().get_field_entry("title").unwrap();
    assert_eq!(entry["name"], "title");
    assert_eq!(entry["type"], "text");
    assert_eq!(entry["options"]["stored"], true);
}

#[test]
fn test_unknown_field_lookup_is_remote() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library.index.schema().get_field("author").unwrap_err();
    assert!(err.is_remote(), "got {err:?}");
}

#[test]
fn test_every_field_kind_round_trips() {
    let client = embedded_client();
    let mut builder = client.new_session();
    builder
        .add_text_field("id", FieldOptions::stored_indexed().raw())
        .unwrap();
    builder
        .add_json_field("attributes", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_date_field("published", FieldOptions::stored_indexed().with_fast())
        .unwrap();
    builder
        .add_u64_field("pages", FieldOptions::stored())
        .unwrap();
    builder
        .add_i64_field("year", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_f64_field("rating", FieldOptions::stored().with_fast())
        .unwrap();
    let documents = builder.build().unwrap();

    let kinds: Vec<FieldKind> = documents
        .schema_description()
        .fields
        .iter()
        .map(|field| field.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::Text,
            FieldKind::Json,
            FieldKind::Date,
            FieldKind::U64,
            FieldKind::I64,
            FieldKind::F64,
        ]
    );
}

#[test]
fn test_dates_and_floats_are_stored() {
    use chrono::{TimeZone, Utc};
    use searchgate::SearchOptions;

    let client = embedded_client();
    let mut builder = client.new_session();
    let title = builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();
    let published = builder
        .add_date_field("published", FieldOptions::stored_indexed())
        .unwrap();
    let rating = builder
        .add_f64_field("rating", FieldOptions::stored())
        .unwrap();
    let documents = builder.build().unwrap();
    let index = documents.create_index_in_ram().unwrap();

    let doc = documents.create_document().unwrap();
    documents.add_text(title, "Dune", doc).unwrap();
    documents
        .add_date(published, Utc.with_ymd_and_hms(1965, 8, 1, 0, 0, 0).unwrap(), doc)
        .unwrap();
    documents.add_f64(rating, 4.5, doc).unwrap();
    let writer = index.create_writer();
    writer.add_document(doc).unwrap();
    writer.commit().unwrap();

    let hits = index
        .create_reader_builder()
        .unwrap()
        .searcher_builder()
        .unwrap()
        .parse_query("dune")
        .unwrap()
        .search(&SearchOptions::default())
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].values("rating")[0].as_f64(), Some(4.5));
    assert_eq!(hits[0].values("published").len(), 1);
}
