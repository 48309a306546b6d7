// ABOUTME: Main library entry point for the shelfscan book metadata extractor.
// ABOUTME: Re-exports the public API: extractors, the Book facade, records, fetchers, sinks and the batch driver.

//! shelfscan - Book metadata extraction from shelf listings and book pages.
//!
//! Pages are fetched through a [`PageFetcher`], parsed once, and read field by
//! field. Missing optional markup yields `None`; a missing required field or a
//! failed fetch fails the whole page.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use shelfscan_extract::{Book, HttpFetcher, Options, ScrapeError};
//!
//! fn main() -> Result<(), ScrapeError> {
//!     let options = Arc::new(Options::default());
//!     let fetcher = Arc::new(HttpFetcher::new(options.timeout)?);
//!     let book = Book::open(
//!         "https://www.goodreads.com/shelf/show/fiction",
//!         1,
//!         fetcher,
//!         options,
//!     )?;
//!     for title in book.titles()? {
//!         println!("{}", title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod headers;
pub mod options;
pub mod record;
pub mod resource;
pub mod sink;

pub use crate::batch::{run_batch, BatchStats};
pub use crate::dispatch::{Book, Extractor, PageKind};
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::extractors::detail::DetailExtractor;
pub use crate::extractors::shelf::{normalize_shelf_url, ShelfExtractor, ShelfSource};
pub use crate::headers::{request_headers, HeaderSet};
pub use crate::options::{Options, OptionsBuilder};
pub use crate::record::{BookDetailRecord, GenreEntry, ReviewEntry, ShelfSummaryRecord};
pub use crate::resource::{FetchResult, HttpFetcher, PageFetcher, StaticFetcher};
pub use crate::sink::{JsonLinesSink, RecordSink};
