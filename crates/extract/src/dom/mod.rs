// ABOUTME: Parsed-page abstraction over scraper's Html with selector, attribute and regex queries.
// ABOUTME: Node handles (ego_tree NodeId) let extractors cache regions alongside the tree that owns them.

//! DOM utilities for querying a parsed page.
//!
//! `MarkupTree` is immutable once parsed. Extractors keep the tree and a set
//! of `NodeId` handles into it, then resolve the handles back to
//! `ElementRef`s on each field access.

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::extractors::compiled::get_or_compile;

/// One fetched page, parsed.
#[derive(Debug)]
pub struct MarkupTree {
    html: Html,
}

impl MarkupTree {
    /// Parse a full HTML document.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// All elements matching a CSS selector, in document order.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match get_or_compile(css) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// First element matching a CSS selector.
    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let sel = get_or_compile(css)?;
        self.html.select(&sel).next()
    }

    /// Elements named `tag` whose `attr` matches `pattern`.
    pub fn find_all_by_attr_regex(
        &self,
        tag: &str,
        attr: &str,
        pattern: &Regex,
    ) -> Vec<ElementRef<'_>> {
        self.elements()
            .filter(|el| {
                el.value().name() == tag
                    && el.value().attr(attr).is_some_and(|v| pattern.is_match(v))
            })
            .collect()
    }

    /// Resolve a handle taken from this tree.
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Resolve a list of handles, skipping any that no longer name an element.
    pub fn elements_for(&self, ids: &[NodeId]) -> Vec<ElementRef<'_>> {
        ids.iter().filter_map(|id| self.element(*id)).collect()
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.root_element().descendants().filter_map(ElementRef::wrap)
    }
}

/// Descendants of `scope` matching a CSS selector.
pub fn select_in<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match get_or_compile(css) {
        Some(sel) => scope.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// First descendant of `scope` matching a CSS selector.
pub fn select_first_in<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = get_or_compile(css)?;
    scope.select(&sel).next()
}

/// Concatenated text of every text node under `el`, untouched.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Handles for a list of elements.
pub fn handles(els: &[ElementRef<'_>]) -> Vec<NodeId> {
    els.iter().map(|el| el.id()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <html><body>
            <div id="reviews">
                <span id="freeText123">first</span>
                <span id="freeTextContainer123">container</span>
                <span id="freeText456">second</span>
                <span id="other">skip</span>
            </div>
            <div class="row" data-kind="a">A <b>bold</b> row</div>
            <div class="row" data-kind="b">B</div>
        </body></html>
    "#;

    #[test]
    fn test_select_preserves_document_order() {
        let tree = MarkupTree::parse(SAMPLE_HTML);
        let rows: Vec<String> = tree.select("div.row").into_iter().map(text_of).collect();
        assert_eq!(rows, vec!["A bold row", "B"]);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let tree = MarkupTree::parse(SAMPLE_HTML);
        assert!(tree.select("[[[").is_empty());
        assert!(tree.select_first("[[[").is_none());
    }

    #[test]
    fn test_attr_regex_is_anchored_by_pattern() {
        let tree = MarkupTree::parse(SAMPLE_HTML);
        let re = Regex::new(r"^freeText[0-9]").unwrap();
        let found: Vec<String> = tree
            .find_all_by_attr_regex("span", "id", &re)
            .into_iter()
            .map(text_of)
            .collect();
        assert_eq!(found, vec!["first", "second"]);
    }

    #[test]
    fn test_handles_resolve_back_to_elements() {
        let tree = MarkupTree::parse(SAMPLE_HTML);
        let ids = handles(&tree.select("div.row"));
        let resolved: Vec<String> = tree.elements_for(&ids).into_iter().map(text_of).collect();
        assert_eq!(resolved, vec!["A bold row", "B"]);
    }

    #[test]
    fn test_scoped_selection() {
        let tree = MarkupTree::parse(SAMPLE_HTML);
        let reviews = tree.select_first("#reviews").unwrap();
        assert_eq!(select_in(reviews, "span").len(), 4);
        assert!(select_first_in(reviews, "div.row").is_none());
    }
}
