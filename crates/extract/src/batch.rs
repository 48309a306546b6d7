// ABOUTME: Batch driver that turns a newline-delimited list of book URLs into indexed JSON records.
// ABOUTME: Failed pages are logged and skipped; ids only advance on success and output stops at max_records.

use std::io::BufRead;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::extractors::detail::DetailExtractor;
use crate::options::Options;
use crate::resource::PageFetcher;
use crate::sink::RecordSink;

/// Counters reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Non-blank lines attempted.
    pub read: usize,
    /// Records written (each as an index line plus a record line).
    pub written: usize,
    /// URLs whose extraction failed.
    pub skipped: usize,
}

/// Extract every URL in `input` and append the results to `sink`.
///
/// Each success produces two values: `{"index": {"_id": n}}` followed by the
/// serialized record, with `n` counting from 1. Extraction failures are logged
/// and skipped. Unreadable input and sink failures abort the batch.
pub fn run_batch<R, S>(
    input: R,
    fetcher: Arc<dyn PageFetcher>,
    options: Arc<Options>,
    sink: &mut S,
) -> Result<BatchStats, ScrapeError>
where
    R: BufRead,
    S: RecordSink + ?Sized,
{
    let mut stats = BatchStats::default();
    if options.max_records == 0 {
        return Ok(stats);
    }

    for line in input.lines() {
        let line = line.map_err(|e| ScrapeError::input("ReadLine", Some(anyhow::Error::new(e))))?;
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        stats.read += 1;

        let extractor = DetailExtractor::new(url, fetcher.clone(), options.clone());
        let record = match extractor.final_result() {
            Ok(record) => record,
            Err(err) => {
                warn!(url, error = %err, "skipping book page");
                stats.skipped += 1;
                continue;
            }
        };

        let value = serde_json::to_value(&record)
            .map_err(|e| ScrapeError::sink("Serialize", Some(anyhow::Error::new(e))))?;
        let id = stats.written + 1;
        sink.write_record(&json!({"index": {"_id": id}}))?;
        sink.write_record(&value)?;
        stats.written = id;
        info!(id, url, title = %record.title, "wrote record");

        if stats.written >= options.max_records {
            info!(max = options.max_records, "record limit reached");
            break;
        }
    }

    sink.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::StaticFetcher;
    use crate::sink::JsonLinesSink;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn book_page(title: &str) -> String {
        format!(
            r#"<html><body>
            <h1 id="bookTitle">{}</h1>
            <span itemprop="name">Some Author</span>
            <span itemprop="ratingValue">3.90</span>
            <meta itemprop="ratingCount" content="1,024">
            <meta itemprop="reviewCount" content="77">
            </body></html>"#,
            title
        )
    }

    fn url(n: usize) -> String {
        format!("https://www.goodreads.com/book/show/{}", n)
    }

    /// Serves books 1..=count, except `missing`.
    fn fetcher(count: usize, missing: &[usize]) -> Arc<dyn PageFetcher> {
        let mut fetcher = StaticFetcher::new();
        for n in 1..=count {
            if !missing.contains(&n) {
                fetcher.insert(url(n), book_page(&format!("Book {}", n)));
            }
        }
        Arc::new(fetcher)
    }

    fn input(urls: &[String]) -> std::io::Cursor<String> {
        std::io::Cursor::new(urls.join("\n"))
    }

    #[test]
    fn test_failed_url_is_skipped_and_batch_continues() {
        let urls: Vec<String> = (1..=5).map(url).collect();
        let mut sink = JsonLinesSink::new(Vec::new());
        let stats = run_batch(
            input(&urls),
            fetcher(5, &[3]),
            Arc::new(Options::default()),
            &mut sink,
        )
        .unwrap();

        assert_eq!(
            stats,
            BatchStats {
                read: 5,
                written: 4,
                skipped: 1
            }
        );

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 8);

        let ids: Vec<u64> = lines
            .iter()
            .step_by(2)
            .map(|v| v["index"]["_id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let titles: Vec<&str> = lines
            .iter()
            .skip(1)
            .step_by(2)
            .map(|v| v["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Book 1", "Book 2", "Book 4", "Book 5"]);
        assert_eq!(lines[1]["rating"], "1024");
        assert_eq!(lines[1]["url"], url(1).as_str());
    }

    #[test]
    fn test_stops_at_max_records() {
        let urls: Vec<String> = (1..=6).map(url).collect();
        let options = Options::builder().max_records(2).build();
        let mut sink: Vec<Value> = Vec::new();
        let stats = run_batch(input(&urls), fetcher(6, &[]), Arc::new(options), &mut sink).unwrap();

        assert_eq!(stats.written, 2);
        assert_eq!(stats.read, 2);
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let text = format!("\n{}\n   \n{}\n\n", url(1), url(2));
        let mut sink: Vec<Value> = Vec::new();
        let stats = run_batch(
            std::io::Cursor::new(text),
            fetcher(2, &[]),
            Arc::new(Options::default()),
            &mut sink,
        )
        .unwrap();

        assert_eq!(stats.read, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn test_missing_required_field_skips_page() {
        let mut fetcher = StaticFetcher::new();
        fetcher.insert(url(1), "<html><body><p>gone</p></body></html>");
        fetcher.insert(url(2), book_page("Book 2"));
        let mut sink: Vec<Value> = Vec::new();
        let stats = run_batch(
            input(&[url(1), url(2)]),
            Arc::new(fetcher),
            Arc::new(Options::default()),
            &mut sink,
        )
        .unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(sink[0]["index"]["_id"], 1);
        assert_eq!(sink[1]["title"], "Book 2");
    }

    #[test]
    fn test_zero_max_writes_nothing() {
        let options = Options::builder().max_records(0).build();
        let mut sink: Vec<Value> = Vec::new();
        let stats = run_batch(input(&[url(1)]), fetcher(1, &[]), Arc::new(options), &mut sink).unwrap();
        assert_eq!(stats, BatchStats::default());
        assert!(sink.is_empty());
    }
}
