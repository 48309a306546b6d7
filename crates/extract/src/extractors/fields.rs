// ABOUTME: Text normalization rules shared by the shelf and detail extractors.
// ABOUTME: Title annotation stripping, extra-info pattern matching, count tokens, year runs and cover URL rewriting.

//! Field normalization helpers.
//!
//! These are pure string functions; the extractors locate the markup and
//! hand the raw text here. A rule that finds nothing returns `None`.

use once_cell::sync::Lazy;
use regex::Regex;

static AVG_RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"rating\s+(\S+)").expect("valid avg rating pattern"));
static RATING_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d,]+)\s*ratings").expect("valid rating count pattern"));
static PUBLISHED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"published\s+(\S+)").expect("valid published pattern"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year pattern"));

/// Length of the low-resolution marker at the end of a thumbnail URL,
/// e.g. `._SX98_.jpg` minus its leading dot.
const THUMBNAIL_SUFFIX_LEN: usize = 10;

/// Drop a trailing `" (series, #n)"` style annotation from a listed title.
pub fn strip_annotation(title: &str) -> String {
    let title = title.trim();
    match title.find('(') {
        Some(idx) => title[..idx].trim_end().to_string(),
        None => title.to_string(),
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Average rating from a shelf entry's extra-info line.
pub fn avg_rating(extra_info: &str) -> Option<String> {
    first_capture(&AVG_RATING_RE, extra_info)
}

/// Rating count from a shelf entry's extra-info line, separators kept.
pub fn rating_count(extra_info: &str) -> Option<String> {
    first_capture(&RATING_COUNT_RE, extra_info)
}

/// Publication year from a shelf entry's extra-info line.
pub fn published_year(extra_info: &str) -> Option<String> {
    first_capture(&PUBLISHED_RE, extra_info)
}

/// First four-digit run in `text`.
pub fn four_digit_run(text: &str) -> Option<String> {
    YEAR_RE.find(text).map(|m| m.as_str().to_string())
}

/// Count text reduced to its first token with thousands separators removed.
///
/// `"  6,508,932 ratings"` becomes `"6508932"`.
pub fn normalize_count(text: &str) -> Option<String> {
    text.split_whitespace()
        .next()
        .map(|token| token.replace(',', ""))
}

/// Rewrite a thumbnail cover URL to its full-size variant.
///
/// `.../books/1234567890._SX98_.jpg` becomes `.../books/1234567890.jpg`.
/// URLs too short to carry the thumbnail marker are returned unchanged.
pub fn upscale_cover(src: &str) -> String {
    if src.len() < THUMBNAIL_SUFFIX_LEN {
        return src.to_string();
    }
    let cut = src.len() - THUMBNAIL_SUFFIX_LEN;
    match src.get(..cut) {
        Some(stem) => format!("{}jpg", stem),
        None => src.to_string(),
    }
}

/// The `n`th (zero-based) whitespace-delimited token.
pub fn nth_token(text: &str, n: usize) -> Option<String> {
    text.split_whitespace().nth(n).map(str::to_string)
}
