// ABOUTME: Error types for shelfscan including the ErrorCode enum and ScrapeError struct.
// ABOUTME: Page-level failures carry a category, the URL, the failing operation and an optional source.

use std::fmt;

/// Categories of page-level failure.
///
/// Field-level misses never produce an error; they surface as `None` on the
/// affected field. Everything listed here aborts the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    MissingField,
    UnknownPageKind,
    Config,
    Input,
    Sink,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::MissingField => "missing required field",
            ErrorCode::UnknownPageKind => "unknown page kind",
            ErrorCode::Config => "configuration error",
            ErrorCode::Input => "input error",
            ErrorCode::Sink => "sink error",
        };
        write!(f, "{}", s)
    }
}

/// The error type for every fallible shelfscan operation.
#[derive(Debug, thiserror::Error)]
pub struct ScrapeError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shelfscan: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ScrapeError {
    fn new(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create a MissingField error naming the field whose markup was not found.
    pub fn missing_field(url: impl Into<String>, field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            url,
            field,
            Some(anyhow::anyhow!("no markup matched for `{}`", field)),
        )
    }

    /// Create an UnknownPageKind error for an unrecognized path segment.
    pub fn unknown_page_kind(url: impl Into<String>, segment: &str) -> Self {
        Self::new(
            ErrorCode::UnknownPageKind,
            url,
            "Dispatch",
            Some(anyhow::anyhow!("no extractor named {:?}", segment)),
        )
    }

    /// Create a Config error.
    pub fn config(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Config, String::new(), op, source)
    }

    /// Create an Input error for an unreadable batch source.
    pub fn input(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Input, String::new(), op, source)
    }

    /// Create a Sink error.
    pub fn sink(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Sink, String::new(), op, source)
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a MissingField error.
    pub fn is_missing_field(&self) -> bool {
        self.code == ErrorCode::MissingField
    }

    /// Returns true if this is an UnknownPageKind error.
    pub fn is_unknown_page_kind(&self) -> bool {
        self.code == ErrorCode::UnknownPageKind
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }
}
