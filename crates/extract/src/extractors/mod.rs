// ABOUTME: Extraction rules for the two page kinds the site serves.
// ABOUTME: Shelf listings and book detail pages, plus shared selector and text helpers.

//! Extraction module.
//!
//! Submodules:
//! - `compiled`: Cached CSS selector compilation.
//! - `fields`: Text normalization shared by both extractors.
//! - `shelf`: Per-book sequences from a paginated shelf listing.
//! - `detail`: The full record for a single book page.

pub mod compiled;
pub mod detail;
pub mod fields;
pub mod shelf;
