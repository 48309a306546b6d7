// ABOUTME: Configuration options for shelfscan: site origin, request settings and batch limits.
// ABOUTME: OptionsBuilder provides a fluent API for constructing Options with custom settings.

use std::collections::HashMap;
use std::time::Duration;

/// Site origin that relative book links are resolved against.
pub const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

/// Number of records a batch run writes before stopping.
pub const DEFAULT_MAX_RECORDS: usize = 49;

/// Below this many primary review nodes the secondary review shape is used.
pub const DEFAULT_REVIEW_THRESHOLD: usize = 5;

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/30.0.1599.101 Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.2) AppleWebKit/535.11 (KHTML, like Gecko) Chrome/17.0.963.12 Safari/535.11",
    "Mozilla/5.0 (compatible; MSIE 10.0; Windows NT 6.2; Trident/6.0)",
    "Mozilla/5.0 (Windows; U; Windows NT 6.1; en-US; rv:1.9.1.6) Gecko/20091201 Firefox/3.5.6",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.1 (KHTML, like Gecko) Chrome/22.0.1207.1 Safari/537.1",
    "Mozilla/5.0 (X11; CrOS i686 2268.111.0) AppleWebKit/536.11 (KHTML, like Gecko) Chrome/20.0.1132.57 Safari/536.11",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/536.6 (KHTML, like Gecko) Chrome/20.0.1092.0 Safari/536.6",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/536.5 (KHTML, like Gecko) Chrome/19.0.1084.9 Safari/536.5",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_8_0) AppleWebKit/536.3 (KHTML, like Gecko) Chrome/19.0.1063.0 Safari/536.3",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/535.24 (KHTML, like Gecko) Chrome/19.0.1055.1 Safari/535.24",
];

/// Configuration shared by the fetcher, the extractors and the batch driver.
#[derive(Debug, Clone)]
pub struct Options {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agents: Vec<String>,
    pub headers: HashMap<String, String>,
    pub max_records: usize,
    pub review_threshold: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            headers: HashMap::new(),
            max_records: DEFAULT_MAX_RECORDS,
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

impl Options {
    /// Start a builder from the default options.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Canonical shelf URL for a named genre.
    pub fn genre_shelf_url(&self, genre: &str) -> String {
        format!("{}/shelf/show/{}", self.base_url.trim_end_matches('/'), genre)
    }

    /// Prefix a site-relative link with the base origin.
    pub fn absolute_link(&self, href: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), href)
    }
}

/// Builder for constructing Options with custom configuration.
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    opts: Options,
}

impl OptionsBuilder {
    /// Create a new OptionsBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the site origin.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.opts.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Replace the user-agent pool.
    pub fn user_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.user_agents = agents.into_iter().map(Into::into).collect();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Set how many records a batch run writes before stopping.
    pub fn max_records(mut self, max: usize) -> Self {
        self.opts.max_records = max;
        self
    }

    /// Set the review shape threshold.
    pub fn review_threshold(mut self, threshold: usize) -> Self {
        self.opts.review_threshold = threshold;
        self
    }

    /// Build the Options.
    pub fn build(self) -> Options {
        self.opts
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
