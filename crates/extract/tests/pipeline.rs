// ABOUTME: End-to-end tests running the Book facade and batch driver against a mock HTTP site.
// ABOUTME: Shelf pages fan out to detail pages over real HTTP; failed pages are skipped by the batch.

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use shelfscan_extract::{
    run_batch, Book, HttpFetcher, JsonLinesSink, Options, PageFetcher, PageKind,
};
use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

const BOOK_PATH: &str = "/book/show/3.Harry_Potter_and_the_Sorcerer_s_Stone";

fn load_html_fixture(name: &str) -> String {
    let path = format!(
        "{}/tests/fixtures/html/{}.html",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    fs::read_to_string(&path).expect(&format!("Failed to read HTML fixture: {}", path))
}

fn site(server: &MockServer) -> (Arc<dyn PageFetcher>, Arc<Options>) {
    let options = Options::builder()
        .base_url(server.base_url())
        .timeout(Duration::from_secs(5))
        .build();
    let fetcher = HttpFetcher::new(options.timeout).unwrap();
    (Arc::new(fetcher), Arc::new(options))
}

fn serve_book(server: &MockServer, path: &str) {
    let html = load_html_fixture("book_harry_potter");
    server.mock(|when, then| {
        when.method(GET).path(path.to_string());
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(html);
    });
}

#[test]
fn shelf_facade_fetches_listing_once_and_fans_out() {
    let server = MockServer::start();
    let shelf = server.mock(|when, then| {
        when.method(GET)
            .path("/shelf/show/fantasy")
            .query_param("page", "2");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(load_html_fixture("shelf_fantasy"));
    });
    serve_book(&server, BOOK_PATH);

    let (fetcher, options) = site(&server);
    let book = Book::open(&server.url("/shelf/show/fantasy?page=9"), 2, fetcher, options).unwrap();
    assert_eq!(book.kind(), PageKind::Shelf);

    assert_eq!(book.titles().unwrap().len(), 3);
    assert_eq!(
        book.shelved_counts().unwrap(),
        ["56,543".to_string(), "41,002".to_string(), "18,220".to_string()]
    );
    assert_eq!(book.detail_links().unwrap()[0], server.url(BOOK_PATH));
    assert_eq!(book.authors().unwrap()[2], None);
    shelf.assert_hits(1);

    let details = book.book_details().unwrap();
    assert_eq!(details.len(), 3);
    let record = details[0].final_result().unwrap();
    assert_eq!(record.title, "Harry Potter and the Sorcerer's Stone");
    assert_eq!(record.source_url, server.url(BOOK_PATH));
    assert!(details[1].final_result().unwrap_err().is_fetch());
}

#[test]
fn book_facade_reads_detail_page() {
    let server = MockServer::start();
    serve_book(&server, BOOK_PATH);

    let (fetcher, options) = site(&server);
    let book = Book::open(&server.url(BOOK_PATH), 1, fetcher, options).unwrap();
    assert_eq!(book.kind(), PageKind::Book);
    assert_eq!(book.titles().unwrap(), ["Harry Potter and the Sorcerer's Stone".to_string()]);
    assert_eq!(book.rating_counts().unwrap(), [Some("8012413".to_string())]);
    assert_eq!(book.published_years().unwrap(), [Some("2003".to_string())]);
}

#[test]
fn batch_over_http_skips_failing_pages() {
    let server = MockServer::start();
    for n in [1, 2, 4, 5] {
        serve_book(&server, &format!("/book/show/{}", n));
    }
    let missing = server.mock(|when, then| {
        when.method(GET).path("/book/show/3");
        then.status(404).body("not found");
    });

    let input: String = (1..=5)
        .map(|n| format!("{}\n", server.url(format!("/book/show/{}", n))))
        .collect();

    let (fetcher, options) = site(&server);
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("books.json");
    let mut sink = JsonLinesSink::append_to(&out_path).unwrap();
    let stats = run_batch(Cursor::new(input), fetcher, options, &mut sink).unwrap();
    drop(sink);

    assert_eq!(stats.written, 4);
    assert_eq!(stats.skipped, 1);
    missing.assert_hits(1);

    let contents = fs::read_to_string(&out_path).unwrap();
    let lines: Vec<Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[6]["index"]["_id"], 4);
    assert_eq!(lines[7]["url"], server.url("/book/show/5").as_str());
    assert_eq!(lines[7]["isbn"], "0439554934");
}
