// ABOUTME: Shelf (listing) page extractor yielding one summary per listed book.
// ABOUTME: Fetches and parses the page once, caches book-unit handles, then runs per-field rules over each unit.

//! Shelf page extraction.
//!
//! A shelf page lists many books. Every book sits in its own `.elementList`
//! fragment under `.leftContainer`; those fragments are located once per
//! extractor and every field accessor walks them in document order.

use std::sync::Arc;

use ego_tree::NodeId;
use once_cell::unsync::OnceCell;
use scraper::ElementRef;
use tracing::debug;

use crate::dom::{handles, select_first_in, text_of, MarkupTree};
use crate::error::ScrapeError;
use crate::extractors::detail::DetailExtractor;
use crate::extractors::fields::{
    avg_rating, nth_token, published_year, rating_count, strip_annotation, upscale_cover,
};
use crate::headers::request_headers;
use crate::options::Options;
use crate::record::ShelfSummaryRecord;
use crate::resource::PageFetcher;

const UNIT_SELECTOR: &str = ".leftContainer .elementList";
const TITLE_ANCHOR: &str = "a.bookTitle";
const AUTHOR_NAME: &str = ".authorName [itemprop=name]";
const ANY_NAME: &str = "span[itemprop=name]";
const EXTRA_INFO: &str = "span.greyText.smallText";
const SHELVED_ANCHOR: &str = "a.smallText";

/// Where a shelf comes from: an explicit URL or a named genre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShelfSource {
    Url(String),
    Genre(String),
}

impl ShelfSource {
    /// Pick a source from optional parts; the URL wins when both are given.
    pub fn from_parts(url: Option<&str>, genre: Option<&str>) -> Result<Self, ScrapeError> {
        match (url, genre) {
            (Some(url), _) => Ok(ShelfSource::Url(url.to_string())),
            (None, Some(genre)) => Ok(ShelfSource::Genre(genre.to_string())),
            (None, None) => Err(ScrapeError::config(
                "ShelfSource",
                Some(anyhow::anyhow!("either a shelf URL or a genre is required")),
            )),
        }
    }
}

/// Strip any existing `?page` query and request `page` instead.
pub fn normalize_shelf_url(url: &str, page: u32) -> String {
    let base = match url.find("?page") {
        Some(idx) => &url[..idx],
        None => url,
    };
    format!("{}?page={}", base, page)
}

struct ShelfPage {
    tree: MarkupTree,
    units: Vec<NodeId>,
}

impl ShelfPage {
    fn parse(markup: &str) -> Self {
        let tree = MarkupTree::parse(markup);
        let units = handles(&tree.select(UNIT_SELECTOR));
        Self { tree, units }
    }
}

/// Extractor for one page of a shelf listing.
pub struct ShelfExtractor {
    url: String,
    page: u32,
    genre: Option<String>,
    fetcher: Arc<dyn PageFetcher>,
    options: Arc<Options>,
    cache: OnceCell<ShelfPage>,
}

impl ShelfExtractor {
    /// Create an extractor for `page` (1-based) of the given shelf.
    ///
    /// Nothing is fetched until a field is first read.
    pub fn new(
        source: ShelfSource,
        page: u32,
        fetcher: Arc<dyn PageFetcher>,
        options: Arc<Options>,
    ) -> Result<Self, ScrapeError> {
        if page == 0 {
            return Err(ScrapeError::config(
                "ShelfExtractor",
                Some(anyhow::anyhow!("page numbers start at 1")),
            ));
        }
        let (base, genre) = match source {
            ShelfSource::Url(url) => (url, None),
            ShelfSource::Genre(genre) => (options.genre_shelf_url(&genre), Some(genre)),
        };
        Ok(Self {
            url: normalize_shelf_url(&base, page),
            page,
            genre,
            fetcher,
            options,
            cache: OnceCell::new(),
        })
    }

    /// Shorthand for a URL-sourced shelf.
    pub fn from_url(
        url: &str,
        page: u32,
        fetcher: Arc<dyn PageFetcher>,
        options: Arc<Options>,
    ) -> Result<Self, ScrapeError> {
        Self::new(ShelfSource::Url(url.to_string()), page, fetcher, options)
    }

    /// Use already-fetched markup instead of fetching on first access.
    pub fn with_markup(self, markup: &str) -> Self {
        let _ = self.cache.set(ShelfPage::parse(markup));
        self
    }

    /// The normalized page URL that is (or would be) fetched.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    fn load(&self) -> Result<&ShelfPage, ScrapeError> {
        self.cache.get_or_try_init(|| {
            let headers = request_headers(&self.options);
            let fetched = self.fetcher.fetch(&self.url, &headers)?;
            let page = ShelfPage::parse(&fetched.text());
            debug!(url = %self.url, units = page.units.len(), "parsed shelf page");
            Ok(page)
        })
    }

    /// Number of books listed on the page.
    pub fn unit_count(&self) -> Result<usize, ScrapeError> {
        Ok(self.load()?.units.len())
    }

    fn each_unit<T>(&self, rule: impl Fn(ElementRef<'_>) -> T) -> Result<Vec<T>, ScrapeError> {
        let page = self.load()?;
        Ok(page
            .tree
            .elements_for(&page.units)
            .into_iter()
            .map(rule)
            .collect())
    }

    fn each_unit_required(
        &self,
        field: &str,
        rule: impl Fn(ElementRef<'_>) -> Option<String>,
    ) -> Result<Vec<String>, ScrapeError> {
        self.each_unit(rule)?
            .into_iter()
            .map(|value| value.ok_or_else(|| ScrapeError::missing_field(&self.url, field)))
            .collect()
    }

    pub fn titles(&self) -> Result<Vec<String>, ScrapeError> {
        self.each_unit_required("title", unit_title)
    }

    pub fn authors(&self) -> Result<Vec<Option<String>>, ScrapeError> {
        self.each_unit(unit_author)
    }

    pub fn avg_ratings(&self) -> Result<Vec<Option<String>>, ScrapeError> {
        self.each_unit(|unit| unit_extra_info(unit).and_then(|info| avg_rating(&info)))
    }

    /// Rating counts as printed, thousands separators included.
    pub fn rating_counts(&self) -> Result<Vec<Option<String>>, ScrapeError> {
        self.each_unit(|unit| unit_extra_info(unit).and_then(|info| rating_count(&info)))
    }

    pub fn published_years(&self) -> Result<Vec<Option<String>>, ScrapeError> {
        self.each_unit(|unit| unit_extra_info(unit).and_then(|info| published_year(&info)))
    }

    pub fn cover_images(&self) -> Result<Vec<String>, ScrapeError> {
        self.each_unit_required("cover_image_url", unit_cover)
    }

    pub fn detail_links(&self) -> Result<Vec<String>, ScrapeError> {
        let options = Arc::clone(&self.options);
        self.each_unit_required("detail_link", move |unit| {
            unit_detail_href(unit).map(|href| options.absolute_link(&href))
        })
    }

    pub fn shelved_counts(&self) -> Result<Vec<String>, ScrapeError> {
        self.each_unit_required("shelved_count", unit_shelved)
    }

    /// One unfetched detail extractor per listed book, in listing order.
    pub fn book_details(&self) -> Result<Vec<DetailExtractor>, ScrapeError> {
        Ok(self
            .detail_links()?
            .into_iter()
            .map(|link| {
                DetailExtractor::new(link, Arc::clone(&self.fetcher), Arc::clone(&self.options))
            })
            .collect())
    }

    /// All summary fields zipped into one record per listed book.
    pub fn summaries(&self) -> Result<Vec<ShelfSummaryRecord>, ScrapeError> {
        let titles = self.titles()?;
        let authors = self.authors()?;
        let avg_ratings = self.avg_ratings()?;
        let rating_counts = self.rating_counts()?;
        let years = self.published_years()?;
        let covers = self.cover_images()?;
        let shelved = self.shelved_counts()?;
        let links = self.detail_links()?;

        let mut records = Vec::with_capacity(titles.len());
        for (i, title) in titles.into_iter().enumerate() {
            records.push(ShelfSummaryRecord {
                title,
                author: authors[i].clone(),
                avg_rating: avg_ratings[i].clone(),
                rating_count: rating_counts[i].clone(),
                published_year: years[i].clone(),
                cover_image_url: covers[i].clone(),
                shelved_count: shelved[i].clone(),
                detail_link: links[i].clone(),
            });
        }
        Ok(records)
    }
}

fn unit_title(unit: ElementRef<'_>) -> Option<String> {
    select_first_in(unit, TITLE_ANCHOR).map(|a| strip_annotation(&text_of(a)))
}

fn unit_author(unit: ElementRef<'_>) -> Option<String> {
    select_first_in(unit, AUTHOR_NAME)
        .or_else(|| select_first_in(unit, ANY_NAME))
        .map(text_of)
}

fn unit_extra_info(unit: ElementRef<'_>) -> Option<String> {
    select_first_in(unit, EXTRA_INFO).map(text_of)
}

fn unit_cover(unit: ElementRef<'_>) -> Option<String> {
    select_first_in(unit, "img")
        .and_then(|img| img.value().attr("src"))
        .map(upscale_cover)
}

fn unit_detail_href(unit: ElementRef<'_>) -> Option<String> {
    select_first_in(unit, TITLE_ANCHOR)
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

fn unit_shelved(unit: ElementRef<'_>) -> Option<String> {
    select_first_in(unit, SHELVED_ANCHOR).and_then(|a| nth_token(&text_of(a), 1))
}
