// Integration tests for the session lifecycle and write path

use crate::common::{embedded_client, Library, RecordingGate, BOOKS};
use searchgate::{
    Client, Config, DocHandle, FieldHandle, FieldOptions, GateError, LocalEngine, Opstamp,
    SearchOptions, TransportError,
};
use std::sync::Arc;

#[test]
fn test_field_handles_follow_declaration_order() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    assert_eq!(library.title, FieldHandle(0));
    assert_eq!(library.body, FieldHandle(1));
    assert_eq!(library.order, FieldHandle(2));
}

#[test]
fn test_document_handles_start_at_one() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let expected: Vec<DocHandle> = (1..=BOOKS.len() as u64).map(DocHandle).collect();
    assert_eq!(library.docs, expected);
}

#[test]
fn test_committed_documents_are_searchable() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let hits = library
        .searcher("order:111")
        .search(&SearchOptions::default())
        .expect("Search failed");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].first_text("title"), Some("The Old Man and the Sea"));
    assert_eq!(hits[0].first_i64("order"), Some(111));
    assert!(hits[0].score.is_some(), "Expected a score on a ranked hit");
}

#[test]
fn test_uncommitted_documents_are_invisible() {
    let client = embedded_client();
    let mut library = Library::in_ram(&client);
    let early = library.parser();
    library.add_book("Moby Dick", "Call me Ishmael.", 444);

    let before = early
        .parse_query("ishmael")
        .unwrap()
        .search(&SearchOptions::default())
        .unwrap();
    assert!(before.is_empty());

    library.index.create_writer().commit().unwrap();

    // A lease taken before the commit keeps its snapshot
    let snapshot = early
        .parse_query("ishmael")
        .unwrap()
        .search(&SearchOptions::default())
        .unwrap();
    assert!(snapshot.is_empty(), "Old lease saw the commit: {snapshot:?}");

    let after = library
        .searcher("ishmael")
        .search(&SearchOptions::default())
        .unwrap();
    assert_eq!(after.len(), 1);
}

#[test]
fn test_superseded_reader_is_refused() {
    let client = embedded_client();
    let mut library = Library::in_ram(&client);
    let old = library.index.create_reader_builder().unwrap();

    library.add_book("Moby Dick", "Call me Ishmael.", 444);
    library.index.create_writer().commit().unwrap();
    let fresh = library.index.create_reader_builder().unwrap();

    let err = old.searcher_builder().unwrap_err();
    assert!(matches!(err, GateError::IllegalTransition(_)), "got {err:?}");

    let parser = fresh.searcher_builder().unwrap();
    let hits = parser
        .parse_query("ishmael")
        .unwrap()
        .search(&SearchOptions::default())
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_superseded_lease_is_refused() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let old = library.parser();
    let _fresh = library.parser();

    let err = old.parse_query("sea").unwrap_err();
    assert!(matches!(err, GateError::IllegalTransition(_)), "got {err:?}");
    let err = old.for_index(&["title"]).unwrap_err();
    assert!(matches!(err, GateError::IllegalTransition(_)), "got {err:?}");
}

#[test]
fn test_opstamps_share_one_sequence() {
    let client = embedded_client();
    let mut builder = client.new_session();
    let title = builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();
    let documents = builder.build().unwrap();
    let index = documents.open_index().unwrap();
    let writer = index.create_writer();

    let mut stamps = Vec::new();
    for name in ["Dune", "Emma"] {
        let doc = documents.create_document().unwrap();
        documents.add_text(title, name, doc).unwrap();
        stamps.push(writer.add_document(doc).unwrap());
    }
    stamps.push(writer.delete_term("title", "emma").unwrap());
    assert_eq!(stamps, vec![Opstamp(0), Opstamp(1), Opstamp(2)]);

    let commit = writer.commit().unwrap();
    assert!(commit.0 > 2, "Commit id {commit} not after the last opstamp");
}

#[test]
fn test_delete_term_then_commit() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    assert_eq!(
        library
            .searcher("mice")
            .search(&SearchOptions::default())
            .unwrap()
            .len(),
        1
    );

    let writer = library.index.create_writer();
    writer.delete_term("title", "mice").unwrap();
    writer.commit().unwrap();

    let hits = library
        .searcher("mice")
        .search(&SearchOptions::default())
        .unwrap();
    assert!(hits.is_empty(), "Deleted book still matched: {hits:?}");
}

#[test]
fn test_delete_term_unparsable_value_is_remote() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library
        .index
        .create_writer()
        .delete_term("order", "not-a-number")
        .unwrap_err();
    assert!(err.is_remote(), "Expected remote error, got {err:?}");
}

#[test]
fn test_delete_term_unknown_field_is_validation() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library
        .index
        .create_writer()
        .delete_term("author", "steinbeck")
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_value_kind_checked_before_sending() {
    let client = embedded_client();
    let library = Library::in_ram(&client);
    let doc = library.documents.create_document().unwrap();

    let err = library
        .documents
        .add_text(library.order, "111", doc)
        .unwrap_err();
    assert!(matches!(err, GateError::Validation(_)), "got {err:?}");
}

#[test]
fn test_unissued_document_handle_rejected() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    let err = library
        .documents
        .add_text(library.title, "Ghost", DocHandle(99))
        .unwrap_err();
    assert!(err.is_validation());

    let err = library
        .index
        .create_writer()
        .add_document(DocHandle(0))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_duplicate_field_name_rejected() {
    let client = embedded_client();
    let mut builder = client.new_session();
    builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();

    let err = builder
        .add_text_field("title", FieldOptions::stored())
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_build_without_fields_fails_remotely() {
    let client = embedded_client();
    let err = client.new_session().build().unwrap_err();
    assert!(err.is_remote(), "got {err:?}");
}

#[test]
fn test_second_index_location_is_illegal() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    // Same location again is a no-op
    library.documents.create_index_in_ram().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let err = library.documents.create_index(dir.path()).unwrap_err();
    assert!(matches!(err, GateError::IllegalTransition(_)), "got {err:?}");
}

#[test]
fn test_released_session_refuses_calls() {
    let client = embedded_client();
    let library = Library::in_ram(&client);

    library.session.release().unwrap();
    assert!(library.session.is_released());
    // Idempotent
    library.session.release().unwrap();

    let err = library.index.create_reader_builder().unwrap_err();
    assert!(
        matches!(
            err,
            GateError::Transport(TransportError::SessionReleased(_))
        ),
        "got {err:?}"
    );
}

#[test]
fn test_dropping_last_stage_releases_session() {
    let gate = Arc::new(RecordingGate::new(LocalEngine::new()));
    let client = Client::new(gate.clone(), Config::default()).unwrap();

    let mut builder = client.new_session();
    let id = builder.session().id().to_string();
    builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();
    drop(builder);

    assert_eq!(gate.released(), vec![id]);
    assert_eq!(gate.inner.session_count(), 0);
}

#[test]
fn test_session_without_calls_skips_gate_release() {
    let gate = Arc::new(RecordingGate::new(LocalEngine::new()));
    let client = Client::new(gate.clone(), Config::default()).unwrap();

    drop(client.new_session());
    assert!(gate.released().is_empty());
}

#[test]
fn test_sessions_do_not_share_state() {
    let client = embedded_client();
    let first = Library::in_ram(&client);
    let second = Library::in_ram(&client);
    assert_ne!(first.session.id(), second.session.id());

    second.index.create_writer().delete_term("title", "sea").unwrap();
    second.index.create_writer().commit().unwrap();

    let hits = first
        .searcher("sea")
        .search(&SearchOptions::default())
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_sessions_on_separate_threads() {
    let client = embedded_client();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            std::thread::spawn(move || {
                let library = Library::in_ram(&client);
                library
                    .searcher("order:222")
                    .search(&SearchOptions::default())
                    .unwrap()
                    .len()
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 1);
    }
}

#[test]
fn test_index_reopened_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books");
    let client = embedded_client();

    {
        let library = Library::at(&client, &path);
        library.session.release().unwrap();
    }
    assert!(path.join("meta.json").exists());

    let mut builder = client.new_session_at(&path);
    builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_text_field("body", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_i64_field("order", FieldOptions::stored_indexed())
        .unwrap();
    let documents = builder.build().unwrap();
    let index = documents.open_index().unwrap();

    let parser = index.create_reader_builder().unwrap().searcher_builder().unwrap();
    let hits = parser
        .parse_query("order:333")
        .unwrap()
        .search(&SearchOptions::default())
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].first_text("title"), Some("Frankenstein"));
}

#[test]
fn test_reopened_index_with_other_field_order_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books");
    let client = embedded_client();
    {
        let library = Library::at(&client, &path);
        library.session.release().unwrap();
    }

    let mut builder = client.new_session_at(&path);
    builder
        .add_text_field("body", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_i64_field("order", FieldOptions::stored_indexed())
        .unwrap();
    let documents = builder.build().unwrap();

    let err = documents.open_index().unwrap_err();
    assert!(err.is_validation(), "got {err:?}");
    assert!(err.message().contains("title"), "got {err:?}");
}

#[test]
fn test_second_writer_on_same_directory_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let client = embedded_client();
    let holder = Library::at(&client, dir.path());

    let mut builder = client.new_session_at(dir.path());
    builder
        .add_text_field("title", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_text_field("body", FieldOptions::stored_indexed())
        .unwrap();
    builder
        .add_i64_field("order", FieldOptions::stored_indexed())
        .unwrap();
    let documents = builder.build().unwrap();
    let index = documents.open_index().unwrap();
    let doc = documents.create_document().unwrap();
    documents.add_text(FieldHandle(0), "Moby Dick", doc).unwrap();

    let err = index.create_writer().add_document(doc).unwrap_err();
    assert!(err.is_remote(), "got {err:?}");

    drop(holder);
}
