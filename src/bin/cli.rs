//! docshelf CLI
//!
//! Command-line interface over an embedded docshelf database.

use clap::{Parser, Subcommand};
use docshelf::{Config, Database, FindOptions, RemoveOptions, UpdateOptions};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// docshelf CLI
#[derive(Parser, Debug)]
#[command(name = "docshelf-cli")]
#[command(about = "CLI for the docshelf document store")]
#[command(version)]
struct Args {
    /// Root directory holding the collection files
    #[arg(short, long, default_value = "./docshelf_data")]
    root: String,

    /// Buffer collections in memory and flush on exit
    #[arg(long)]
    in_memory: bool,

    /// Flush interval in milliseconds (in-memory mode)
    #[arg(long, default_value = "10000")]
    flush_interval_ms: u64,

    /// Collection to operate on
    collection: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find documents
    Find {
        /// Criteria as JSON (all documents if omitted)
        criteria: Option<String>,

        /// Return only the first match
        #[arg(long)]
        one: bool,
    },

    /// Insert one document
    Insert {
        /// Document as a JSON object
        document: String,
    },

    /// Insert several documents
    InsertMany {
        /// Documents as a JSON array of objects
        documents: String,
    },

    /// Update matching documents
    Update {
        /// Criteria as JSON
        criteria: String,

        /// Update spec as JSON
        spec: String,

        /// Update only the first match
        #[arg(long)]
        one: bool,

        /// Insert when nothing matches
        #[arg(long)]
        upsert: bool,
    },

    /// Remove matching documents
    Remove {
        /// Criteria as JSON (`{}` removes everything)
        criteria: String,

        /// Remove only the first match
        #[arg(long)]
        one: bool,
    },

    /// Count documents
    Count {
        /// Criteria as JSON (all documents if omitted)
        criteria: Option<String>,
    },

    /// List distinct values of a field
    Distinct {
        /// Field name (dotted paths allowed)
        field: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,docshelf=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> docshelf::Result<()> {
    let config = Config::builder()
        .root_dir(&args.root)
        .in_memory(args.in_memory)
        .flush_interval_ms(args.flush_interval_ms)
        .build();

    let database = Database::connect(config, &[args.collection.as_str()]).await?;
    let collection = database.collection(&args.collection)?;

    let output = match args.command {
        Commands::Find { criteria, one } => {
            let criteria = parse_optional(criteria.as_deref())?;
            let found = collection.find(&criteria, FindOptions { multi: !one }).await?;
            serde_json::to_value(found)?
        }
        Commands::Insert { document } => {
            let stored = collection.insert(&parse(&document)?).await?;
            Value::Object(stored)
        }
        Commands::InsertMany { documents } => {
            let stored = collection.insert_many(&parse(&documents)?).await?;
            serde_json::to_value(stored)?
        }
        Commands::Update { criteria, spec, one, upsert } => {
            let options = UpdateOptions::default().multi(!one).upsert(upsert);
            let outcome = collection.update(&parse(&criteria)?, &parse(&spec)?, options).await?;
            match outcome.result() {
                Some(result) => serde_json::to_value(result)?,
                None => serde_json::to_value(outcome.documents())?,
            }
        }
        Commands::Remove { criteria, one } => {
            let removed = collection
                .remove(&parse(&criteria)?, RemoveOptions { multi: !one })
                .await?;
            Value::Bool(removed)
        }
        Commands::Count { criteria } => {
            let criteria = parse_optional(criteria.as_deref())?;
            Value::from(collection.count(&criteria).await?)
        }
        Commands::Distinct { field } => Value::Array(collection.distinct(&field).await?),
    };

    drop(collection);
    database.close().await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse(raw: &str) -> docshelf::Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| docshelf::ShelfError::InvalidArgument(format!("invalid JSON {:?}: {}", raw, e)))
}

fn parse_optional(raw: Option<&str>) -> docshelf::Result<Value> {
    raw.map_or(Ok(Value::Null), parse)
}
