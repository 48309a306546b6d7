// ABOUTME: CLI for extracting book metadata with the shelfscan library.
// ABOUTME: Runs the batch driver or prints shelf, detail or dispatched page data as JSON.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use shelfscan_extract::{
    run_batch, Book, DetailExtractor, HttpFetcher, JsonLinesSink, Options, PageFetcher, PageKind,
    ShelfExtractor, ShelfSource, StaticFetcher,
};
use tracing::info;

/// Extract book metadata from shelf listings and book pages.
#[derive(Parser, Debug)]
#[command(name = "shelfscan")]
#[command(about = "Extract book metadata and print JSON", long_about = None)]
struct Cli {
    /// Site origin used for genre shelves and relative links.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Extra request header as NAME:VALUE (repeatable).
    #[arg(long = "header", global = true)]
    headers: Vec<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, global = true, default_value_t = false)]
    compact: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract every book URL in a file and append JSON lines to the output.
    Batch {
        /// Newline-delimited list of book page URLs.
        #[arg(long)]
        input: PathBuf,

        /// JSON-lines file to append to.
        #[arg(long)]
        output: PathBuf,

        /// Stop after this many records.
        #[arg(long)]
        max: Option<usize>,
    },
    /// Print the full record for one book page.
    Detail {
        url: String,

        /// Parse a saved page instead of fetching.
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Print per-book summaries for one page of a shelf.
    Shelf {
        /// Shelf URL; wins over --genre when both are given.
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Parse a saved page instead of fetching.
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Classify a URL and print the fields it yields.
    Show {
        url: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = Arc::new(build_options(&cli)?);
    let fetcher: Arc<dyn PageFetcher> = Arc::new(
        HttpFetcher::new(options.timeout).context("failed to build HTTP client")?,
    );

    match &cli.command {
        Commands::Batch { input, output, max } => {
            let mut options = (*options).clone();
            if let Some(max) = max {
                options.max_records = *max;
            }
            let reader = BufReader::new(
                File::open(input)
                    .with_context(|| format!("failed to open input {}", input.display()))?,
            );
            let mut sink = JsonLinesSink::append_to(output)?;
            let stats = run_batch(reader, fetcher, Arc::new(options), &mut sink)?;
            info!(
                read = stats.read,
                written = stats.written,
                skipped = stats.skipped,
                "batch finished"
            );
        }
        Commands::Detail { url, html } => {
            let extractor = match html {
                Some(path) => DetailExtractor::new(url.as_str(), offline(), options)
                    .with_markup(&read_markup(path)?),
                None => DetailExtractor::new(url.as_str(), fetcher, options),
            };
            let record = extractor.final_result()?;
            print_json(&serde_json::to_value(&record)?, cli.compact)?;
        }
        Commands::Shelf {
            url,
            genre,
            page,
            html,
        } => {
            let source = ShelfSource::from_parts(url.as_deref(), genre.as_deref())?;
            let extractor = match html {
                Some(path) => ShelfExtractor::new(source, *page, offline(), options)?
                    .with_markup(&read_markup(path)?),
                None => ShelfExtractor::new(source, *page, fetcher, options)?,
            };
            let summaries = extractor.summaries()?;
            print_json(&serde_json::to_value(&summaries)?, cli.compact)?;
        }
        Commands::Show { url, page } => {
            let book = Book::open(url, *page, fetcher, options)?;
            print_json(&facade_json(&book)?, cli.compact)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_options(cli: &Cli) -> Result<Options> {
    let mut builder = Options::builder().timeout(Duration::from_secs(cli.timeout));
    if let Some(base) = &cli.base_url {
        builder = builder.base_url(base.trim_end_matches('/'));
    }
    for header in &cli.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("invalid header {:?}, expected NAME:VALUE", header);
        };
        builder = builder.header(name.trim(), value.trim());
    }
    Ok(builder.build())
}

fn offline() -> Arc<dyn PageFetcher> {
    Arc::new(StaticFetcher::new())
}

fn read_markup(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn facade_json(book: &Book) -> Result<Value> {
    let kind = match book.kind() {
        PageKind::Shelf => "shelf",
        PageKind::Book => "book",
    };
    Ok(json!({
        "kind": kind,
        "titles": book.titles()?,
        "authors": book.authors()?,
        "avg_ratings": book.avg_ratings()?,
        "rating_counts": book.rating_counts()?,
        "published_years": book.published_years()?,
        "cover_images": book.cover_images()?,
        "shelved_counts": book.shelved_counts()?,
        "detail_links": book.detail_links()?,
    }))
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    if compact {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}
