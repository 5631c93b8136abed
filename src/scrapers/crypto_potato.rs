//! CryptoPotato search results scraper.
//!
//! CryptoPotato is a WordPress site: `?s=<query>` lists `.cp-post` cards
//! newest first, each with a `span.post-date` such as `"5 hours ago"` or
//! `"Oct 20, 2025"`.

use super::{ArticleLayout, Listing, NewsSource, SearchForm, element_text, extract_article};
use crate::models::{Article, ListingEntry};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static POST: Lazy<Selector> = Lazy::new(|| Selector::parse("div.cp-post").expect("selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("selector"));
static POST_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.post-date").expect("selector"));

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1.post-title").expect("selector"));
static CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.post-details-content").expect("selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("selector"));

#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoPotato;

impl NewsSource for CryptoPotato {
    fn name(&self) -> &'static str {
        "crypto_potato"
    }

    fn search_form(&self) -> SearchForm {
        SearchForm {
            action: "https://cryptopotato.com/",
            field: "s",
        }
    }

    // The whole results page is the container; a page with no cards is an
    // empty listing rather than a missing one.
    fn listing(&self, document: &Html, page_url: &Url) -> Option<Listing> {
        let entries: Vec<ListingEntry> = document
            .select(&POST)
            .map(|post| ListingEntry {
                link: post
                    .select(&LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string),
                recency: post
                    .select(&POST_DATE)
                    .next()
                    .map(element_text),
            })
            .collect();

        debug!(count = entries.len(), "Found CryptoPotato posts");
        Some(Listing {
            base: page_url.clone(),
            entries,
        })
    }

    fn extract(&self, document: &Html) -> Article {
        extract_article(
            document,
            &ArticleLayout {
                title: &TITLE,
                content: &CONTENT,
                paragraph: &PARAGRAPH,
            },
        )
    }
}
