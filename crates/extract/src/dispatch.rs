// ABOUTME: URL-driven dispatch between the shelf and detail extractors behind one Book facade.
// ABOUTME: PageKind classifies a URL; Book caches each field sequence after its first computation.

use std::slice;
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::error::ScrapeError;
use crate::extractors::detail::DetailExtractor;
use crate::extractors::shelf::ShelfExtractor;
use crate::options::Options;
use crate::resource::PageFetcher;

/// The two page shapes the site serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Shelf,
    Book,
}

impl PageKind {
    /// Classify a URL by its third-from-last path segment.
    ///
    /// `.../shelf/show/fiction` is a shelf and `.../book/show/123-title` a
    /// book; any other segment is a lookup error.
    pub fn classify(url: &str) -> Result<Self, ScrapeError> {
        let segments: Vec<&str> = url.split('/').collect();
        let segment = segments
            .len()
            .checked_sub(3)
            .map(|idx| segments[idx])
            .unwrap_or_default();
        match title_case(segment).as_str() {
            "Shelf" => Ok(PageKind::Shelf),
            "Book" => Ok(PageKind::Book),
            other => Err(ScrapeError::unknown_page_kind(url, other)),
        }
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// The extractor a `Book` delegates to.
pub enum Extractor {
    Shelf(ShelfExtractor),
    Detail(DetailExtractor),
}

/// Uniform, lazily computed view over either page kind.
///
/// A detail page reads as a one-book listing: `titles()` has one entry,
/// `book_details()` is the extractor itself, and `shelved_counts()` is empty.
pub struct Book {
    deputy: Extractor,
    titles: OnceCell<Vec<String>>,
    authors: OnceCell<Vec<Option<String>>>,
    avg_ratings: OnceCell<Vec<Option<String>>>,
    rating_counts: OnceCell<Vec<Option<String>>>,
    published_years: OnceCell<Vec<Option<String>>>,
    cover_images: OnceCell<Vec<String>>,
    shelved_counts: OnceCell<Vec<String>>,
    detail_links: OnceCell<Vec<String>>,
    book_details: OnceCell<Vec<DetailExtractor>>,
}

impl Book {
    /// Pick the extractor for `url` and wrap it. Nothing is fetched yet.
    pub fn open(
        url: &str,
        page: u32,
        fetcher: Arc<dyn PageFetcher>,
        options: Arc<Options>,
    ) -> Result<Self, ScrapeError> {
        let deputy = match PageKind::classify(url)? {
            PageKind::Shelf => Extractor::Shelf(ShelfExtractor::from_url(url, page, fetcher, options)?),
            PageKind::Book => Extractor::Detail(DetailExtractor::new(url, fetcher, options)),
        };
        Ok(Self::from_extractor(deputy))
    }

    /// Wrap an already constructed extractor.
    pub fn from_extractor(deputy: Extractor) -> Self {
        Self {
            deputy,
            titles: OnceCell::new(),
            authors: OnceCell::new(),
            avg_ratings: OnceCell::new(),
            rating_counts: OnceCell::new(),
            published_years: OnceCell::new(),
            cover_images: OnceCell::new(),
            shelved_counts: OnceCell::new(),
            detail_links: OnceCell::new(),
            book_details: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> PageKind {
        match self.deputy {
            Extractor::Shelf(_) => PageKind::Shelf,
            Extractor::Detail(_) => PageKind::Book,
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.deputy
    }

    pub fn titles(&self) -> Result<&[String], ScrapeError> {
        self.titles
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.titles(),
                Extractor::Detail(detail) => Ok(vec![detail.title()?]),
            })
            .map(Vec::as_slice)
    }

    pub fn authors(&self) -> Result<&[Option<String>], ScrapeError> {
        self.authors
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.authors(),
                Extractor::Detail(detail) => Ok(vec![Some(detail.author()?)]),
            })
            .map(Vec::as_slice)
    }

    pub fn avg_ratings(&self) -> Result<&[Option<String>], ScrapeError> {
        self.avg_ratings
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.avg_ratings(),
                Extractor::Detail(detail) => Ok(vec![Some(detail.score()?)]),
            })
            .map(Vec::as_slice)
    }

    pub fn rating_counts(&self) -> Result<&[Option<String>], ScrapeError> {
        self.rating_counts
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.rating_counts(),
                Extractor::Detail(detail) => Ok(vec![Some(detail.rating_count()?)]),
            })
            .map(Vec::as_slice)
    }

    pub fn published_years(&self) -> Result<&[Option<String>], ScrapeError> {
        self.published_years
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.published_years(),
                Extractor::Detail(detail) => Ok(vec![detail.year()?]),
            })
            .map(Vec::as_slice)
    }

    pub fn cover_images(&self) -> Result<&[String], ScrapeError> {
        self.cover_images
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.cover_images(),
                Extractor::Detail(detail) => Ok(detail.image_url()?.into_iter().collect()),
            })
            .map(Vec::as_slice)
    }

    pub fn shelved_counts(&self) -> Result<&[String], ScrapeError> {
        self.shelved_counts
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.shelved_counts(),
                Extractor::Detail(_) => Ok(Vec::new()),
            })
            .map(Vec::as_slice)
    }

    pub fn detail_links(&self) -> Result<&[String], ScrapeError> {
        self.detail_links
            .get_or_try_init(|| match &self.deputy {
                Extractor::Shelf(shelf) => shelf.detail_links(),
                Extractor::Detail(detail) => Ok(vec![detail.url().to_string()]),
            })
            .map(Vec::as_slice)
    }

    pub fn book_details(&self) -> Result<&[DetailExtractor], ScrapeError> {
        match &self.deputy {
            Extractor::Shelf(shelf) => self
                .book_details
                .get_or_try_init(|| shelf.book_details())
                .map(Vec::as_slice),
            Extractor::Detail(detail) => Ok(slice::from_ref(detail)),
        }
    }
}
