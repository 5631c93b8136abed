//! Listing harvesting and article extraction for the supported sources.
//!
//! Every source follows the same two-phase pattern:
//!
//! 1. **Harvesting**: read the search results listing for a topic and keep the
//!    most recent article links, stopping at the first stale entry
//! 2. **Extraction**: read each article page into an [`Article`]
//!
//! Sources only describe *where* things live in their markup (the
//! [`NewsSource`] trait). The traversal rules live once, in [`harvest`] and
//! [`extract_article`].
//!
//! # Supported Sources
//!
//! | Source | Module | Listing | Recency marker |
//! |--------|--------|---------|----------------|
//! | Yahoo Finance | [`yahoo_finance`] | `recent-news` section | `"TheStreet • 3h ago"` |
//! | CryptoPotato | [`crypto_potato`] | `.cp-post` cards | `"5 hours ago"`, `"Oct 20, 2025"` |

use crate::models::{Article, Candidate, ListingEntry, NO_CONTENT, NO_TITLE};
use crate::recency::{RecencyWindow, is_within_window};
use clap::ValueEnum;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};
use url::Url;

pub mod crypto_potato;
pub mod yahoo_finance;

/// The search box of a source, submitted as a GET form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    /// Absolute URL the form submits to.
    pub action: &'static str,
    /// Name of the query field.
    pub field: &'static str,
}

/// A parsed listing page: its entries in document order and the URL that
/// relative links resolve against.
#[derive(Debug, Clone)]
pub struct Listing {
    pub base: Url,
    pub entries: Vec<ListingEntry>,
}

/// Markup knowledge about one news site.
pub trait NewsSource {
    /// Stable identifier, also used to namespace cache records.
    fn name(&self) -> &'static str;

    /// The site's search form.
    fn search_form(&self) -> SearchForm;

    /// Read the listing out of a search results page.
    ///
    /// Returns `None` when the page has no recent-items container at all.
    fn listing(&self, document: &Html, page_url: &Url) -> Option<Listing>;

    /// Read an article page.
    fn extract(&self, document: &Html) -> Article;
}

/// The configured source, selectable from the CLI and the run file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    YahooFinance,
    CryptoPotato,
}

impl SourceKind {
    pub fn build(self) -> Box<dyn NewsSource> {
        match self {
            SourceKind::YahooFinance => Box::new(yahoo_finance::YahooFinance),
            SourceKind::CryptoPotato => Box::new(crypto_potato::CryptoPotato),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::YahooFinance => f.write_str("yahoo_finance"),
            SourceKind::CryptoPotato => f.write_str("crypto_potato"),
        }
    }
}

/// Pick at most `max_items` recent article URLs from a listing.
///
/// Entries are assumed most-recent-first. The first entry whose recency
/// marker falls outside `window` ends the walk: nothing after it is
/// considered, even if it looks fresh. A marker that is present but blank
/// or unreadable counts as outside the window. Entries without a marker
/// element are not checked. Entries without a usable link are skipped.
///
/// # Arguments
///
/// * `listing` - Entries of a search results page in document order
/// * `window` - How many calendar days back an entry may be dated
/// * `max_items` - Upper bound on the number of candidates returned
///
/// # Returns
///
/// Candidates with absolute http(s) URLs, ranked from `0` in listing order.
pub fn harvest(listing: &Listing, window: RecencyWindow, max_items: usize) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();

    for (position, entry) in listing.entries.iter().enumerate() {
        if candidates.len() >= max_items {
            break;
        }

        if let Some(recency) = entry.recency.as_deref() {
            if !is_within_window(recency, window) {
                debug!(position, %recency, "Stale entry; stopping");
                break;
            }
        }

        let Some(url) = entry
            .link
            .as_deref()
            .and_then(|href| resolve_link(&listing.base, href))
        else {
            debug!(position, "Entry has no usable link; skipping");
            continue;
        };

        candidates.push(Candidate {
            url,
            rank: candidates.len(),
        });
    }

    info!(
        count = candidates.len(),
        entries = listing.entries.len(),
        timeframe = %window.describe(),
        "Harvested candidates"
    );
    candidates
}

/// Resolve an `href` against the listing URL, keeping only http(s) targets.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Where a source keeps the parts of an article page.
pub struct ArticleLayout<'a> {
    pub title: &'a Selector,
    pub content: &'a Selector,
    pub paragraph: &'a Selector,
}

/// Read an article page using a source's layout.
///
/// The first title element and the first content container win. A missing
/// title yields [`NO_TITLE`]; a missing container yields [`NO_CONTENT`].
pub fn extract_article(document: &Html, layout: &ArticleLayout<'_>) -> Article {
    let title = document
        .select(layout.title)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let body = match document.select(layout.content).next() {
        Some(container) => container
            .select(layout.paragraph)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        None => NO_CONTENT.to_string(),
    };

    debug!(%title, bytes = body.len(), "Extracted article");
    Article { title, body }
}

/// Text of an element with runs of whitespace collapsed to one space.
///
/// Text nodes are concatenated as they appear, so inline markup such as
/// `rose 5<b>%</b>.` reads `rose 5%.`.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().join(" ")
}
