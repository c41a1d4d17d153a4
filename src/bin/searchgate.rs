//! searchgate - index a couple of books and run one query against them
//!
//! Drives the embedded engine through the full capability chain, the
//! same way an application drives a native engine behind the gate.
//!
//! # Examples
//!
//! ```bash
//! # Index in RAM and look up a book by its order number
//! searchgate --query "order:111"
//!
//! # Persist the index and search the text fields
//! searchgate --dir /tmp/books --query "mice"
//! ```

use clap::Parser;
use searchgate::{Client, Config, FieldOptions, Hit, SearchOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Index a small book collection and search it
#[derive(Parser, Debug)]
#[command(name = "searchgate")]
#[command(version)]
#[command(about = "Session-scoped full-text search demo", long_about = None)]
struct Args {
    /// Directory for the index; omitted means RAM
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Query in the engine's query language
    #[arg(long, default_value = "order:111")]
    query: String,

    /// Maximum number of hits to print
    #[arg(long, default_value_t = 10)]
    limit: u64,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

const BOOKS: &[(&str, &str, u64)] = &[
    (
        "The Old Man and the Sea",
        "He was an old man who fished alone in a skiff in the Gulf Stream.",
        111,
    ),
    (
        "Of Mice and Men",
        "A few miles south of Soledad, the Salinas River drops in close to the hillside bank.",
        222,
    ),
];

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "searchgate=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

fn run(args: &Args) -> searchgate::Result<Vec<Hit>> {
    let config = Config::load()?;
    config.log_config();

    let client = Client::embedded(config)?;
    let mut builder = match &args.dir {
        Some(dir) => client.new_session_at(dir),
        None => client.new_session(),
    };
    let session = builder.session().clone();

    let title = builder.add_text_field("title", FieldOptions::stored_indexed())?;
    let body = builder.add_text_field("body", FieldOptions::stored_indexed())?;
    let order = builder.add_u64_field("order", FieldOptions::stored_indexed())?;
    let documents = builder.build()?;

    let index = documents.open_index()?;
    let writer = index.create_writer();
    for (book_title, book_body, book_order) in BOOKS {
        let doc = documents.create_document()?;
        documents.add_text(title, book_title, doc)?;
        documents.add_text(body, book_body, doc)?;
        documents.add_uint(order, *book_order, doc)?;
        writer.add_document(doc)?;
    }
    writer.commit()?;

    let parser = index.create_reader_builder()?.searcher_builder()?;
    parser.for_index(&["title", "body"])?;
    let searcher = parser.parse_query(&args.query)?;
    let hits = searcher.search(&SearchOptions::default().with_limit(args.limit))?;

    session.release()?;
    Ok(hits)
}

fn main() {
    let args = Args::parse();
    init_logging(args.json_logs);

    tracing::info!("Starting searchgate {}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(hits) => {
            tracing::info!("Query '{}' matched {} hit(s)", args.query, hits.len());
            for hit in &hits {
                match serde_json::to_string(hit) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
