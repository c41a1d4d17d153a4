// Integration tests for query parsing and searching

use crate::common::{client_with_buffer, embedded_client, Library};
use searchgate::{
    DocHandle, FieldOptions, GateError, SearchOptions, TopLimit, TransportError,
};

fn titles(hits: &[searchgate::Hit]) -> Vec<&str> {
    hits.iter()
        .map(|hit| hit.first_text("title").unwrap_or_default())
        .collect()
}

#[test]
fn test_ranked_hits_are_ordered_by_score() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let hits = library
        .searcher("sea")
        .search(&SearchOptions::default())
        .expect("Search failed");

    assert_eq!(hits.len(), 2);
    let scores: Vec<f32> = hits.iter().map(|hit| hit.score.unwrap()).collect();
    assert!(
        scores.windows(2).all(|pair| pair[0] >= pair[1]),
        "Scores not descending: {scores:?}"
    );
}

#[test]
fn test_limit_and_offset_window_the_ranking() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let searcher = library.searcher("sea");
    let all = searcher.search(&SearchOptions::default()).unwrap();

    let top = searcher
        .search(&SearchOptions::default().with_limit(1))
        .unwrap();
    assert_eq!(titles(&top), titles(&all[..1]));

    let rest = searcher
        .search(&SearchOptions::default().with_offset(1))
        .unwrap();
    assert_eq!(titles(&rest), titles(&all[1..]));
}

#[test]
fn test_unscored_search_has_no_scores() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let hits = library
        .searcher("sea")
        .search(&SearchOptions::default().unscored())
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.score.is_none()));
    // Address order: insertion order within the single segment
    assert_eq!(titles(&hits), vec!["The Old Man and the Sea", "Frankenstein"]);
}

#[test]
fn test_search_raw_uses_engine_defaults() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let hits = library.searcher("sea").search_raw().unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.explanation.is_none()));
    assert!(hits.iter().all(|hit| hit.score.is_none()), "got {hits:?}");
}

#[test]
fn test_searcher_runs_its_own_query() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let parser = library.parser();

    let first = parser.parse_query("order:111").unwrap();
    let second = parser.parse_query("order:222").unwrap();

    let err = first.search(&SearchOptions::default()).unwrap_err();
    assert!(matches!(err, GateError::IllegalTransition(_)), "got {err:?}");
    let err = first.search_raw().unwrap_err();
    assert!(matches!(err, GateError::IllegalTransition(_)), "got {err:?}");

    let hits = second.search(&SearchOptions::default()).unwrap();
    assert_eq!(titles(&hits), vec!["Of Mice and Men"]);
}

#[test]
fn test_fuzzy_searcher_outlives_plain_query_only() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let parser = library.parser();

    let fuzzy = parser.parse_fuzzy_query("title", "mise").unwrap();
    parser.parse_query("sea").unwrap();
    let hits = fuzzy.fuzzy_search(TopLimit::Unbounded).unwrap();
    assert_eq!(titles(&hits), vec!["Of Mice and Men"]);

    parser.parse_fuzzy_query("title", "see").unwrap();
    let err = fuzzy.fuzzy_search(TopLimit::Unbounded).unwrap_err();
    assert!(matches!(err, GateError::IllegalTransition(_)), "got {err:?}");
}

#[test]
fn test_explained_search_with_snippets() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let hits = library
        .searcher("sea")
        .search(&SearchOptions::default().explained().with_snippets(["title"]))
        .unwrap();

    assert!(hits.iter().all(|hit| hit.explanation.is_some()));
    let old_man = hits
        .iter()
        .find(|hit| hit.first_i64("order") == Some(111))
        .expect("Expected The Old Man and the Sea");
    assert!(
        old_man.snippets["title"].contains("<b>Sea</b>"),
        "Unexpected snippet: {}",
        old_man.snippets["title"]
    );
}

#[test]
fn test_snippet_field_must_exist() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library
        .searcher("sea")
        .search(&SearchOptions::default().with_snippets(["author"]))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_docset_then_get_document() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let searcher = library.searcher("sea");

    let docset = searcher.docset(true, TopLimit::Unbounded, 0).unwrap();
    assert_eq!(docset.len(), 2);
    assert!(docset.iter().all(|entry| entry.score.is_some()));

    let hit = searcher.get_document(&docset[0], true, &["body"]).unwrap();
    assert_eq!(hit.score, docset[0].score);
    assert!(hit.explanation.is_some());
    assert!(hit.snippets.contains_key("body"));
    assert!(hit.first_text("title").is_some());
}

#[test]
fn test_unscored_docset_in_address_order() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let docset = library
        .searcher("sea")
        .docset(false, TopLimit::Top(10), 0)
        .unwrap();
    let addresses: Vec<(u32, u32)> = docset
        .iter()
        .map(|entry| (entry.segment_ord, entry.doc_id))
        .collect();
    assert_eq!(addresses, vec![(0, 0), (0, 2)]);
    assert!(docset.iter().all(|entry| entry.score.is_none()));
}

#[test]
fn test_snippets_for_session_documents() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let snippets = library
        .searcher("sea")
        .snippet(library.title, &library.docs)
        .unwrap();

    assert_eq!(snippets.len(), library.docs.len());
    assert_eq!(snippets[0].doc_id, DocHandle(1));
    assert!(snippets[0].html.contains("<b>Sea</b>"));
    assert!(snippets[1].fragment.is_empty());
}

#[test]
fn test_snippet_needs_text_field() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library
        .searcher("sea")
        .snippet(library.order, &library.docs)
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_unknown_query_field_is_query_error() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library.parser().parse_query("nosuchfield:abc").unwrap_err();
    assert!(matches!(err, GateError::Query(_)), "got {err:?}");
    assert!(err.is_remote());
}

#[test]
fn test_for_index_unknown_field_is_validation() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library.parser().for_index(&["title", "author"]).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_fuzzy_query_tolerates_one_edit() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let hits = library
        .parser()
        .parse_fuzzy_query("title", "mise")
        .unwrap()
        .fuzzy_search(TopLimit::Unbounded)
        .unwrap();
    assert_eq!(titles(&hits), vec!["Of Mice and Men"]);
}

#[test]
fn test_fuzzy_query_rejects_numeric_field() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library
        .parser()
        .parse_fuzzy_query("order", "111")
        .unwrap_err();
    assert!(matches!(err, GateError::Query(_)), "got {err:?}");
}

#[test]
fn test_small_buffer_grows_transparently() {
    let small = client_with_buffer(8, 1 << 20);
    let roomy = embedded_client();
    let options = SearchOptions::default().explained().with_snippets(["body"]);

    let expected = Library::in_ram(&roomy)
        .searcher("sea")
        .search(&options)
        .unwrap();
    let hits = Library::in_ram(&small)
        .searcher("sea")
        .search(&options)
        .unwrap();

    assert_eq!(titles(&hits), titles(&expected));
    assert_eq!(hits[0].snippets, expected[0].snippets);
}

#[test]
fn test_reply_beyond_ceiling_fails() {
    let client = client_with_buffer(8, 64);
    let mut builder = client.new_session();
    builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_text_field("body", FieldOptions::stored_indexed())
        .unwrap();

    let err = builder.build().unwrap_err();
    assert!(
        matches!(
            err,
            GateError::Transport(TransportError::BufferTooSmall { limit: 64, .. })
        ),
        "got {err:?}"
    );
}
