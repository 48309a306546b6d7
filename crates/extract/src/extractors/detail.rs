// ABOUTME: Book detail page extractor producing a single BookDetailRecord.
// ABOUTME: Locates every named region once per fetch and applies per-field rules and fallbacks to the cached handles.

//! Detail page extraction.
//!
//! The first field access fetches the page, parses it and records a handle
//! for each region the fields read from. Later accesses only resolve those
//! handles; the page is never fetched twice.

use std::sync::Arc;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

use crate::dom::{handles, select_first_in, select_in, text_of, MarkupTree};
use crate::error::ScrapeError;
use crate::extractors::fields::{four_digit_run, normalize_count};
use crate::headers::request_headers;
use crate::options::Options;
use crate::record::{BookDetailRecord, GenreEntry, ReviewEntry};
use crate::resource::PageFetcher;

static REVIEW_TEXT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^freeText[0-9]").expect("valid review id pattern"));
static REVIEW_CONTAINER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^freeTextContainer[0-9]").expect("valid review container pattern"));

const INFO_ROWS: &str = "#bookDataBox .clearFloats";
const INFO_ROW_TITLE: &str = ".infoBoxRowTitle";
const INFO_ROW_ITEM: &str = ".infoBoxRowItem";
const DESCRIPTION: &str = "#description";
const HIDDEN_SPAN: &str = r#"span[style="display:none"]"#;
const GENRE_LINKS: &str = "a.actionLinkLite.bookPageGenreLink";
const SEE_MORE: &str = "a.actionLink.right.seeMoreLink";
const NAME_SPANS: &str = "span[itemprop=name]";
const TITLE: &str = "h1#bookTitle";
const SCORE: &str = "span[itemprop=ratingValue]";
const YEAR_CONTAINER: &str = "div.uitext.darkGreyText";
const YEAR_ROW: &str = "div.row";
const YEAR_INLINE: &str = "nobr.greyText";
const RATING_COUNT: &str = "meta[itemprop=ratingCount]";
const REVIEW_COUNT: &str = "meta[itemprop=reviewCount]";
const COVER: &str = "img#coverImage";

/// Handles to every region of a detail page that a field reads from.
#[derive(Debug, Default)]
struct Regions {
    info_rows: Vec<NodeId>,
    description: Vec<NodeId>,
    genres: Vec<NodeId>,
    review_texts: Vec<NodeId>,
    review_containers: Vec<NodeId>,
    see_more: Option<NodeId>,
    names: Vec<NodeId>,
    title: Option<NodeId>,
    score: Option<NodeId>,
    year_container: Option<NodeId>,
    rating_count: Option<NodeId>,
    reviewer_count: Option<NodeId>,
    cover: Option<NodeId>,
}

impl Regions {
    fn locate(tree: &MarkupTree) -> Self {
        let first = |css: &str| tree.select_first(css).map(|el| el.id());
        Self {
            info_rows: handles(&tree.select(INFO_ROWS)),
            description: handles(&tree.select(DESCRIPTION)),
            genres: handles(&tree.select(GENRE_LINKS)),
            review_texts: handles(&tree.find_all_by_attr_regex("span", "id", &REVIEW_TEXT_ID)),
            review_containers: handles(&tree.find_all_by_attr_regex(
                "span",
                "id",
                &REVIEW_CONTAINER_ID,
            )),
            see_more: first(SEE_MORE),
            names: handles(&tree.select(NAME_SPANS)),
            title: first(TITLE),
            score: first(SCORE),
            year_container: first(YEAR_CONTAINER),
            rating_count: first(RATING_COUNT),
            reviewer_count: first(REVIEW_COUNT),
            cover: first(COVER),
        }
    }
}

struct DetailPage {
    tree: MarkupTree,
    regions: Regions,
}

impl DetailPage {
    fn parse(markup: &str) -> Self {
        let tree = MarkupTree::parse(markup);
        let regions = Regions::locate(&tree);
        Self { tree, regions }
    }

    fn one(&self, id: Option<NodeId>) -> Option<ElementRef<'_>> {
        id.and_then(|id| self.tree.element(id))
    }

    fn many(&self, ids: &[NodeId]) -> Vec<ElementRef<'_>> {
        self.tree.elements_for(ids)
    }

    fn isbn(&self) -> Option<String> {
        self.many(&self.regions.info_rows).into_iter().find_map(|row| {
            let label = select_first_in(row, INFO_ROW_TITLE).map(text_of)?;
            if label.trim() != "ISBN" {
                return None;
            }
            let value = select_first_in(row, INFO_ROW_ITEM).map(text_of)?;
            value.split_whitespace().next().map(str::to_string)
        })
    }

    fn description(&self) -> Option<Vec<u8>> {
        for container in self.many(&self.regions.description) {
            let spans = select_in(container, "span");
            if spans.len() == 1 {
                return Some(text_of(spans[0]).into_bytes());
            }
            if let Some(hidden) = select_first_in(container, HIDDEN_SPAN) {
                return Some(text_of(hidden).into_bytes());
            }
        }
        None
    }

    fn genres(&self) -> Vec<String> {
        self.many(&self.regions.genres).into_iter().map(text_of).collect()
    }

    fn reviews(&self, threshold: usize) -> Vec<String> {
        let source = if self.regions.review_texts.len() < threshold {
            &self.regions.review_containers
        } else {
            &self.regions.review_texts
        };
        self.many(source).into_iter().map(text_of).collect()
    }

    fn recommend_link(&self) -> Option<String> {
        self.one(self.regions.see_more)
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }

    fn author(&self) -> Option<String> {
        let names = self.many(&self.regions.names);
        // With two or more, the first credits a narrator or illustrator.
        let canonical = if names.len() > 1 { names.get(1) } else { names.first() };
        canonical.map(|el| text_of(*el))
    }

    fn title(&self) -> Option<String> {
        self.one(self.regions.title).map(|el| text_of(el).trim().to_string())
    }

    fn score(&self) -> Option<String> {
        self.one(self.regions.score).map(|el| text_of(el).trim().to_string())
    }

    fn year(&self) -> Option<String> {
        let container = self.one(self.regions.year_container)?;
        let rows = select_in(container, YEAR_ROW);
        match rows.len() {
            0 => None,
            1 => select_first_in(rows[0], YEAR_INLINE).and_then(|tag| four_digit_run(&text_of(tag))),
            _ => four_digit_run(&text_of(rows[1])),
        }
    }

    fn rating_count(&self) -> Option<String> {
        self.one(self.regions.rating_count)
            .and_then(|el| normalize_count(&count_text(el)))
    }

    fn reviewer_count(&self) -> Option<String> {
        self.one(self.regions.reviewer_count)
            .and_then(|el| normalize_count(&count_text(el)))
    }

    fn image_url(&self) -> Option<String> {
        self.one(self.regions.cover)
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string)
    }
}

/// Text a count meta tag stands for.
///
/// A `<meta>` is void in HTML5, so its own text is normally empty; the
/// `content` attribute and then the visible label around it are used instead.
fn count_text(el: ElementRef<'_>) -> String {
    let own = text_of(el);
    if !own.trim().is_empty() {
        return own;
    }
    if let Some(content) = el.value().attr("content") {
        if !content.trim().is_empty() {
            return content.to_string();
        }
    }
    el.parent()
        .and_then(ElementRef::wrap)
        .map(text_of)
        .unwrap_or_default()
}

/// Extractor for a single book detail page.
pub struct DetailExtractor {
    url: String,
    fetcher: Arc<dyn PageFetcher>,
    options: Arc<Options>,
    cache: OnceCell<DetailPage>,
}

impl DetailExtractor {
    /// Create an extractor for an absolute detail-page URL. Nothing is fetched yet.
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn PageFetcher>, options: Arc<Options>) -> Self {
        Self {
            url: url.into(),
            fetcher,
            options,
            cache: OnceCell::new(),
        }
    }

    /// Use already-fetched markup instead of fetching on first access.
    pub fn with_markup(self, markup: &str) -> Self {
        let _ = self.cache.set(DetailPage::parse(markup));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn load(&self) -> Result<&DetailPage, ScrapeError> {
        self.cache.get_or_try_init(|| {
            let headers = request_headers(&self.options);
            let fetched = self.fetcher.fetch(&self.url, &headers)?;
            let page = DetailPage::parse(&fetched.text());
            debug!(url = %self.url, "parsed detail page");
            Ok(page)
        })
    }

    fn required(&self, field: &str, value: Option<String>) -> Result<String, ScrapeError> {
        value.ok_or_else(|| ScrapeError::missing_field(&self.url, field))
    }

    pub fn isbn(&self) -> Result<Option<String>, ScrapeError> {
        Ok(self.load()?.isbn())
    }

    /// Description as raw UTF-8 bytes.
    pub fn description(&self) -> Result<Option<Vec<u8>>, ScrapeError> {
        Ok(self.load()?.description())
    }

    pub fn genres(&self) -> Result<Vec<String>, ScrapeError> {
        Ok(self.load()?.genres())
    }

    pub fn reviews(&self) -> Result<Vec<String>, ScrapeError> {
        Ok(self.load()?.reviews(self.options.review_threshold))
    }

    pub fn recommend_link(&self) -> Result<Option<String>, ScrapeError> {
        Ok(self.load()?.recommend_link())
    }

    pub fn author(&self) -> Result<String, ScrapeError> {
        let value = self.load()?.author();
        self.required("author", value)
    }

    pub fn title(&self) -> Result<String, ScrapeError> {
        let value = self.load()?.title();
        self.required("title", value)
    }

    pub fn score(&self) -> Result<String, ScrapeError> {
        let value = self.load()?.score();
        self.required("score", value)
    }

    pub fn year(&self) -> Result<Option<String>, ScrapeError> {
        Ok(self.load()?.year())
    }

    /// Rating count with thousands separators removed.
    pub fn rating_count(&self) -> Result<String, ScrapeError> {
        let value = self.load()?.rating_count();
        self.required("rating_count", value)
    }

    /// Reviewer count with thousands separators removed.
    pub fn reviewer_count(&self) -> Result<String, ScrapeError> {
        let value = self.load()?.reviewer_count();
        self.required("reviewer_count", value)
    }

    pub fn image_url(&self) -> Result<Option<String>, ScrapeError> {
        Ok(self.load()?.image_url())
    }

    /// Assemble every field into one record.
    pub fn final_result(&self) -> Result<BookDetailRecord, ScrapeError> {
        Ok(BookDetailRecord {
            isbn: self.isbn()?,
            description: self.description()?,
            genres: self
                .genres()?
                .into_iter()
                .map(|g| GenreEntry { g })
                .collect(),
            reviews: self
                .reviews()?
                .into_iter()
                .map(|r| ReviewEntry { r })
                .collect(),
            recommend_link: self.recommend_link()?,
            author: self.author()?,
            title: self.title()?,
            score: self.score()?,
            year: self.year()?,
            rating_count: self.rating_count()?,
            reviewer_count: self.reviewer_count()?,
            image_url: self.image_url()?,
            source_url: self.url.clone(),
        })
    }
}
