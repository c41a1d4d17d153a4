// Test fixtures for integration testing

use searchgate::{
    Client, DocHandle, Document, FieldHandle, FieldOptions, Index, QueryParser, Searcher, Session,
};
use std::path::Path;
use std::sync::Arc;

/// (title, body, order) of the books indexed by [`Library`]
#[allow(dead_code)] // Used in integration tests
pub const BOOKS: &[(&str, &str, i64)] = &[
    (
        "The Old Man and the Sea",
        "He was an old man who fished alone in a skiff in the Gulf Stream \
         and he had gone eighty-four days now without taking a fish.",
        111,
    ),
    (
        "Of Mice and Men",
        "A few miles south of Soledad, the Salinas River drops in close to \
         the hillside bank and runs deep and green.",
        222,
    ),
    (
        "Frankenstein",
        "You will rejoice to hear that no disaster has accompanied the \
         commencement of an enterprise which you have regarded with such \
         evil forebodings. The sea was calm.",
        333,
    ),
];

/// Session with a three-field book schema and committed books
#[allow(dead_code)] // Used in integration tests
pub struct Library {
    pub session: Arc<Session>,
    pub title: FieldHandle,
    pub body: FieldHandle,
    pub order: FieldHandle,
    pub documents: Document,
    pub index: Index,
    pub docs: Vec<DocHandle>,
}

#[allow(dead_code)] // Used in integration tests
impl Library {
    /// Index [`BOOKS`] in RAM
    pub fn in_ram(client: &Client) -> Self {
        Self::build(client, None)
    }

    /// Index [`BOOKS`] under `dir`
    pub fn at(client: &Client, dir: &Path) -> Self {
        Self::build(client, Some(dir))
    }

    fn build(client: &Client, dir: Option<&Path>) -> Self {
        let mut builder = match dir {
            Some(dir) => client.new_session_at(dir),
            None => client.new_session(),
        };
        let session = builder.session().clone();
        let title = builder
            .add_text_field("title", FieldOptions::stored_indexed())
            .expect("add title");
        let body = builder
            .add_text_field("body", FieldOptions::stored_indexed())
            .expect("add body");
        let order = builder
            .add_i64_field("order", FieldOptions::stored_indexed())
            .expect("add order");
        let documents = builder.build().expect("build schema");
        let index = documents.open_index().expect("open index");

        let mut library = Self {
            session,
            title,
            body,
            order,
            documents,
            index,
            docs: Vec::new(),
        };
        for (title, body, order) in BOOKS {
            library.add_book(title, body, *order);
        }
        library.index.create_writer().commit().expect("commit");
        library
    }

    /// Create, populate and hand one book to the writer (uncommitted)
    pub fn add_book(&mut self, title: &str, body: &str, order: i64) -> DocHandle {
        let doc = self.documents.create_document().expect("create document");
        self.documents
            .add_text(self.title, title, doc)
            .expect("add title");
        self.documents.add_text(self.body, body, doc).expect("add body");
        self.documents.add_int(self.order, order, doc).expect("add order");
        self.index
            .create_writer()
            .add_document(doc)
            .expect("add document");
        self.docs.push(doc);
        doc
    }

    /// Fresh reader and query parser over the title and body fields
    pub fn parser(&self) -> QueryParser {
        let parser = self
            .index
            .create_reader_builder()
            .expect("reader")
            .searcher_builder()
            .expect("searcher");
        parser.for_index(&["title", "body"]).expect("for_index");
        parser
    }

    pub fn searcher(&self, query: &str) -> Searcher {
        self.parser().parse_query(query).expect("parse query")
    }
}
