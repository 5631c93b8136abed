//! Yahoo Finance search results scraper.
//!
//! The search results page carries a `recent-news` section whose cards are
//! ordered newest first. Each card has a footer like `"TheStreet • 3h ago"`
//! and a headline link. Yahoo's class names carry generated suffixes
//! (`yf-1rjrr1`), so selectors only rely on the stable half.

use super::{ArticleLayout, Listing, NewsSource, SearchForm, element_text, extract_article};
use crate::models::{Article, ListingEntry};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

static RECENT_NEWS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"section[data-testid="recent-news"]"#).expect("selector"));
static ENTRY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.content").expect("selector"));
static PUBLISHING: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.footer div.publishing").expect("selector"));
static HEADLINE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.subtle-link.titles[href]").expect("selector"));

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1.cover-title").expect("selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.body").expect("selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("selector"));

#[derive(Debug, Clone, Copy, Default)]
pub struct YahooFinance;

impl NewsSource for YahooFinance {
    fn name(&self) -> &'static str {
        "yahoo_finance"
    }

    fn search_form(&self) -> SearchForm {
        SearchForm {
            action: "https://finance.yahoo.com/lookup/",
            field: "s",
        }
    }

    fn listing(&self, document: &Html, page_url: &Url) -> Option<Listing> {
        let Some(section) = document.select(&RECENT_NEWS).next() else {
            warn!(url = %page_url, "Could not find recent news section");
            return None;
        };

        let entries: Vec<ListingEntry> = section
            .select(&ENTRY)
            .map(|card| ListingEntry {
                link: card
                    .select(&HEADLINE_LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string),
                recency: card
                    .select(&PUBLISHING)
                    .next()
                    .map(element_text),
            })
            .collect();

        debug!(count = entries.len(), "Found entries in recent news section");
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
                content: &BODY,
                paragraph: &PARAGRAPH,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_CONTENT, NO_TITLE};
    use crate::recency::RecencyWindow;
    use crate::scrapers::harvest;

    const SEARCH_PAGE: &str = r#"
    <html><body>
      <section data-testid="trending"><div class="content">
        <a class="subtle-link fin-size-small titles noUnderline yf-106qqvl" href="https://finance.yahoo.com/news/trending.html">Trending</a>
      </div></section>
      <section data-testid="recent-news">
        <div class="content yf-1y7058a">
          <a class="subtle-link fin-size-small titles noUnderline yf-106qqvl" href="https://finance.yahoo.com/news/solana-etf.html"><h3>Solana ETF</h3></a>
          <div class="footer yf-lfbf5f"><div class="publishing yf-m1e6lz">TheStreet <i>•</i> 3h ago</div></div>
        </div>
        <div class="content yf-1y7058a">
          <a class="subtle-link fin-size-small titles noUnderline yf-106qqvl" href="/news/solana-stale.html"><h3>Old</h3></a>
          <div class="footer yf-lfbf5f"><div class="publishing yf-m1e6lz">Reuters • 3d ago</div></div>
        </div>
        <div class="content yf-1y7058a">
          <a class="subtle-link fin-size-small titles noUnderline yf-106qqvl" href="/news/solana-fresh.html"><h3>Fresh</h3></a>
          <div class="footer yf-lfbf5f"><div class="publishing yf-m1e6lz">Barron's • 1h ago</div></div>
        </div>
      </section>
    </body></html>"#;

    const ARTICLE_PAGE: &str = r#"
    <html><body>
      <h1 class="cover-title yf-1rjrr1">Solana ETF inflows hit record</h1>
      <div class="body yf-h0on0w">
        <p class="yf-1090901">Inflows reached $1B.</p>
        <p class="yf-1090901"></p>
        <p class="yf-1090901">Analysts expect more.</p>
      </div>
    </body></html>"#;

    fn search_url() -> Url {
        Url::parse("https://finance.yahoo.com/lookup/?s=Solana").unwrap()
    }

    #[test]
    fn test_listing_reads_recent_news_only() {
        let doc = Html::parse_document(SEARCH_PAGE);
        let listing = YahooFinance.listing(&doc, &search_url()).unwrap();
        assert_eq!(listing.entries.len(), 3);
        assert_eq!(
            listing.entries[0].link.as_deref(),
            Some("https://finance.yahoo.com/news/solana-etf.html")
        );
        assert_eq!(listing.entries[0].recency.as_deref(), Some("TheStreet • 3h ago"));
        assert_eq!(listing.entries[1].link.as_deref(), Some("/news/solana-stale.html"));
    }

    #[test]
    fn test_harvest_stops_at_stale_card() {
        let doc = Html::parse_document(SEARCH_PAGE);
        let listing = YahooFinance.listing(&doc, &search_url()).unwrap();
        let candidates = harvest(&listing, RecencyWindow::new(2).unwrap(), 4);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://finance.yahoo.com/news/solana-etf.html");
    }

    #[test]
    fn test_blank_publishing_line_is_stale() {
        let doc = Html::parse_document(
            r#"<html><body><section data-testid="recent-news">
                <div class="content">
                  <a class="subtle-link titles" href="/news/undated.html">Undated</a>
                  <div class="footer"><div class="publishing"> </div></div>
                </div>
                <div class="content">
                  <a class="subtle-link titles" href="/news/fresh.html">Fresh</a>
                  <div class="footer"><div class="publishing">Reuters • 1h ago</div></div>
                </div>
            </section></body></html>"#,
        );
        let listing = YahooFinance.listing(&doc, &search_url()).unwrap();
        assert_eq!(listing.entries[0].recency.as_deref(), Some(""));
        assert!(harvest(&listing, RecencyWindow::new(2).unwrap(), 4).is_empty());
    }

    #[test]
    fn test_missing_recent_news_section() {
        let doc = Html::parse_document("<html><body><p>No results</p></body></html>");
        assert!(YahooFinance.listing(&doc, &search_url()).is_none());
    }

    #[test]
    fn test_extract_article() {
        let doc = Html::parse_document(ARTICLE_PAGE);
        let article = YahooFinance.extract(&doc);
        assert_eq!(article.title, "Solana ETF inflows hit record");
        assert_eq!(article.body, "Inflows reached $1B.\nAnalysts expect more.");
    }

    #[test]
    fn test_extract_article_without_body() {
        let doc = Html::parse_document("<html><body><h2>Consent required</h2></body></html>");
        let article = YahooFinance.extract(&doc);
        assert_eq!(article.title, NO_TITLE);
        assert_eq!(article.body, NO_CONTENT);
    }
}
