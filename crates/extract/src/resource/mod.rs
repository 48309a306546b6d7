// ABOUTME: Page fetching behind the PageFetcher trait, with a blocking HTTP and an in-memory implementation.
// ABOUTME: Handles scheme validation, content-length limits, status checks and charset decoding.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::error::ScrapeError;
use crate::headers::HeaderSet;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Raw markup returned by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body to text, using the content-type charset when present.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Source of page markup.
///
/// Implementations fail with a `Fetch` error on transport failure; the
/// extractors never retry.
pub trait PageFetcher {
    fn fetch(&self, url: &str, headers: &HeaderSet) -> Result<FetchResult, ScrapeError>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ScrapeError::config("HttpFetcher", Some(anyhow::anyhow!("client build: {}", e)))
            })?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str, headers: &HeaderSet) -> Result<FetchResult, ScrapeError> {
        if url.is_empty() {
            return Err(ScrapeError::invalid_url(url, "Fetch", None));
        }

        let parsed_url = url::Url::parse(url).map_err(|e| {
            ScrapeError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        let scheme = parsed_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ScrapeError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        let mut request = self.client.get(parsed_url.as_str());
        for (key, value) in headers {
            // reqwest derives Host from the URL itself
            if key.eq_ignore_ascii_case("host") {
                continue;
            }
            request = request.header(key, value);
        }

        debug!(url, "fetching page");
        let response = request.send().map_err(|e| {
            ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
        })?;

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(ScrapeError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large")),
                ));
            }
        }

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response.bytes().map_err(|e| {
            ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        })?;

        if body.len() > MAX_CONTENT_LENGTH {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }

        if status != 200 {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status {}", status)),
            ));
        }

        debug!(url, bytes = body.len(), "fetched page");
        Ok(FetchResult {
            status,
            url: url.to_string(),
            final_url,
            content_type,
            body,
        })
    }
}

/// Fetcher that serves pre-loaded markup keyed by URL.
///
/// Used for saved pages (`--html`) and tests. Unknown URLs fail like a
/// transport error would.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Bytes>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register markup for a URL.
    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.pages.insert(url.into(), body.into());
    }

    /// Builder-style variant of `insert`.
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.insert(url, body);
        self
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch(&self, url: &str, _headers: &HeaderSet) -> Result<FetchResult, ScrapeError> {
        let body = self.pages.get(url).cloned().ok_or_else(|| {
            ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("no page stored for URL")))
        })?;
        Ok(FetchResult {
            status: 200,
            url: url.to_string(),
            final_url: url.to_string(),
            content_type: Some("text/html; charset=utf-8".to_string()),
            body,
        })
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}
