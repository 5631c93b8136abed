//! Per-topic orchestration: cache check, harvest, extract, analyze, store.
//!
//! Topics are processed one after another, and within a topic every page is
//! visited one after another. A topic that fails anywhere after the cache
//! check is logged and replaced by a degraded [`TopicResult`]; the run itself
//! always completes and yields one result per topic, in topic order.

use crate::api::Summarizer;
use crate::cache::TopicCache;
use crate::models::{Article, Candidate, TopicResult};
use crate::recency::RecencyWindow;
use crate::scrapers::{NewsSource, harvest};
use crate::session::BrowsingSession;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};

/// Summary used when pages for a topic could not be collected.
pub const COLLECTION_FAILED: &str = "Error collecting articles";
/// Summary used when the summarizer call fails.
pub const ANALYSIS_FAILED: &str = "Error analyzing articles";
/// Summary used when no recent article was found.
pub const NO_RECENT_ARTICLES: &str = "No recent articles found";

/// Runs the acquisition pipeline for a list of topics.
pub struct Pipeline<Z> {
    source: Box<dyn NewsSource>,
    summarizer: Z,
    cache: TopicCache,
    window: RecencyWindow,
    max_articles: usize,
}

impl<Z: Summarizer> Pipeline<Z> {
    pub fn new(
        source: Box<dyn NewsSource>,
        summarizer: Z,
        cache: TopicCache,
        window: RecencyWindow,
        max_articles: usize,
    ) -> Self {
        Self {
            source,
            summarizer,
            cache,
            window,
            max_articles,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Process every topic in order and return the aggregate report.
    #[instrument(level = "info", skip_all, fields(source = self.source.name(), topics = topics.len()))]
    pub async fn run<S: BrowsingSession>(&self, session: &mut S, topics: &[String]) -> Vec<TopicResult> {
        info!(
            topics = %topics.join(", "),
            timeframe = %self.window.describe(),
            max_articles = self.max_articles,
            "Starting run"
        );

        let mut report = Vec::with_capacity(topics.len());
        for topic in topics {
            report.push(self.process_topic(session, topic).await);
        }

        info!(results = report.len(), "Run complete");
        report
    }

    #[instrument(level = "info", skip(self, session))]
    async fn process_topic<S: BrowsingSession>(&self, session: &mut S, topic: &str) -> TopicResult {
        if let Some(cached) = self.cached(topic).await {
            info!("Using cached analysis");
            return cached;
        }

        let articles = match self.collect_articles(session, topic).await {
            Ok(articles) => articles,
            Err(e) => {
                error!(error = %e, "Failed to collect articles; degrading topic");
                return TopicResult::degraded(topic, COLLECTION_FAILED);
            }
        };

        if articles.is_empty() {
            warn!(timeframe = %self.window.describe(), "No recent articles; skipping analysis");
            return TopicResult::degraded(topic, NO_RECENT_ARTICLES);
        }

        let result = match self.summarizer.summarize(topic, &articles).await {
            Ok(analysis) => TopicResult::from_analysis(topic, analysis),
            Err(e) => {
                error!(error = %e, "Summarizer failed; degrading topic");
                return TopicResult::degraded(topic, ANALYSIS_FAILED);
            }
        };

        if let Err(e) = self.cache.store(topic, &result).await {
            error!(error = %e, "Failed to store cache record");
        }
        info!(sentiment = %result.sentiment, "Topic analyzed");
        result
    }

    /// The cached result for today, if one exists and is readable.
    async fn cached(&self, topic: &str) -> Option<TopicResult> {
        if !self.cache.has(topic).await {
            return None;
        }
        match self.cache.load(topic).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "Unreadable cache record; treating as miss");
                None
            }
        }
    }

    /// Search for `topic`, harvest the listing, and visit each candidate.
    async fn collect_articles<S: BrowsingSession>(
        &self,
        session: &mut S,
        topic: &str,
    ) -> Result<Vec<Article>, Box<dyn Error>> {
        let candidates = self.harvest_topic(session, topic).await?;
        info!(count = candidates.len(), "Articles to visit");

        let mut articles = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            articles.push(self.visit(session, candidate).await?);
        }
        Ok(articles)
    }

    async fn harvest_topic<S: BrowsingSession>(
        &self,
        session: &mut S,
        topic: &str,
    ) -> Result<Vec<Candidate>, Box<dyn Error>> {
        session.submit_query(&self.source.search_form(), topic).await?;

        let page_url = session
            .current_url()
            .cloned()
            .ok_or("session has no current page after search")?;
        let document = session.page()?;

        Ok(match self.source.listing(&document, &page_url) {
            Some(listing) => harvest(&listing, self.window, self.max_articles),
            None => Vec::new(),
        })
    }

    async fn visit<S: BrowsingSession>(
        &self,
        session: &mut S,
        candidate: &Candidate,
    ) -> Result<Article, Box<dyn Error>> {
        debug!(url = %candidate.url, rank = candidate.rank, "Visiting article");
        session.navigate(&candidate.url).await?;
        let document = session.page()?;
        Ok(self.source.extract(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Analysis, Sentiment};
    use crate::scrapers::SearchForm;
    use crate::scrapers::yahoo_finance::YahooFinance;
    use chrono::NaiveDate;
    use scraper::Html;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;
    use url::Url;

    const SEARCH_ACTION: &str = "https://finance.yahoo.com/lookup/";

    /// Serves canned pages and records every URL it is asked to load.
    #[derive(Default)]
    struct FakeSession {
        pages: HashMap<String, String>,
        current: Option<Url>,
        visited: Vec<String>,
    }

    impl FakeSession {
        fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn with_search_results(self, topic: &str, html: &str) -> Self {
            let url = crate::session::search_url(
                &SearchForm {
                    action: SEARCH_ACTION,
                    field: "s",
                },
                topic,
            )
            .unwrap();
            self.with_page(url.as_str(), html)
        }
    }

    impl BrowsingSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> Result<(), Box<dyn Error>> {
            self.visited.push(url.to_string());
            if !self.pages.contains_key(url) {
                return Err(format!("timed out loading {url}").into());
            }
            self.current = Some(Url::parse(url)?);
            Ok(())
        }

        async fn submit_query(&mut self, form: &SearchForm, query: &str) -> Result<(), Box<dyn Error>> {
            let url = crate::session::search_url(form, query)?;
            self.navigate(url.as_str()).await
        }

        fn current_url(&self) -> Option<&Url> {
            self.current.as_ref()
        }

        fn page(&self) -> Result<Html, Box<dyn Error>> {
            let url = self.current.as_ref().ok_or("no page")?;
            Ok(Html::parse_document(&self.pages[url.as_str()]))
        }
    }

    /// Returns a fixed analysis, or fails, and records what it was given.
    struct FakeSummarizer {
        analysis: Option<Analysis>,
        calls: RefCell<Vec<(String, Vec<Article>)>>,
    }

    impl FakeSummarizer {
        fn returning(summary: &str, sentiment: Sentiment) -> Self {
            Self {
                analysis: Some(Analysis {
                    summary: summary.to_string(),
                    sentiment,
                }),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                analysis: None,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Summarizer for FakeSummarizer {
        async fn summarize(&self, topic: &str, articles: &[Article]) -> Result<Analysis, Box<dyn Error>> {
            self.calls
                .borrow_mut()
                .push((topic.to_string(), articles.to_vec()));
            self.analysis.clone().ok_or_else(|| "model unavailable".into())
        }
    }

    fn cache(dir: &Path) -> TopicCache {
        TopicCache::new(dir, "yahoo_finance")
            .with_clock(|| NaiveDate::from_ymd_opt(2025, 10, 20).unwrap())
    }

    fn pipeline<Z: Summarizer>(summarizer: Z, dir: &Path) -> Pipeline<Z> {
        Pipeline::new(
            Box::new(YahooFinance),
            summarizer,
            cache(dir),
            RecencyWindow::new(1).unwrap(),
            4,
        )
    }

    fn results_page(cards: &[(&str, &str)]) -> String {
        let cards: String = cards
            .iter()
            .map(|(href, when)| {
                format!(
                    r#"<div class="content">
                         <a class="subtle-link titles" href="{href}">headline</a>
                         <div class="footer"><div class="publishing">Wire • {when}</div></div>
                       </div>"#
                )
            })
            .collect();
        format!(r#"<html><body><section data-testid="recent-news">{cards}</section></body></html>"#)
    }

    const ARTICLE: &str = r#"<html><body>
        <h1 class="cover-title">Solana ETF approved</h1>
        <div class="body"><p>Big day.</p></div>
    </body></html>"#;

    fn topics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fresh_then_cached_run() {
        let dir = tempdir().unwrap();
        let article_url = "https://finance.yahoo.com/news/solana-etf.html";

        let mut session = FakeSession::default()
            .with_search_results("Solana", &results_page(&[(article_url, "2h ago")]))
            .with_page(article_url, ARTICLE);
        let summarizer = FakeSummarizer::returning("X", Sentiment::Bullish);
        let first = pipeline(summarizer, dir.path());

        let report = first.run(&mut session, &topics(&["Solana", "IONQ"])).await;

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].topic, "Solana");
        assert_eq!(report[0].summary, "X");
        assert_eq!(report[0].sentiment, Sentiment::Bullish);
        assert_eq!(report[1].topic, "IONQ");
        assert_eq!(report[1].sentiment, Sentiment::Unknown);

        let calls = first.summarizer.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Solana");
        assert_eq!(
            calls[0].1,
            vec![Article {
                title: "Solana ETF approved".to_string(),
                body: "Big day.".to_string(),
            }]
        );
        drop(calls);

        // Same day, new process: no navigation for the cached topic.
        let mut second_session = FakeSession::default();
        let second = pipeline(FakeSummarizer::failing(), dir.path());
        let again = second.run(&mut second_session, &topics(&["Solana"])).await;

        assert_eq!(again, vec![report[0].clone()]);
        assert!(second_session.visited.is_empty());
        assert!(second.summarizer.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_summarizer_failure_degrades_and_is_not_cached() {
        let dir = tempdir().unwrap();
        let article_url = "https://finance.yahoo.com/news/a.html";
        let mut session = FakeSession::default()
            .with_search_results("Solana", &results_page(&[(article_url, "just now")]))
            .with_page(article_url, ARTICLE);

        let p = pipeline(FakeSummarizer::failing(), dir.path());
        let report = p.run(&mut session, &topics(&["Solana"])).await;

        assert_eq!(report[0].summary, ANALYSIS_FAILED);
        assert_eq!(report[0].sentiment, Sentiment::Unknown);
        assert!(!p.cache.has("Solana").await);
    }

    #[tokio::test]
    async fn test_navigation_failure_degrades_only_that_topic() {
        let dir = tempdir().unwrap();
        let good_url = "https://finance.yahoo.com/news/good.html";
        let mut session = FakeSession::default()
            // The IONQ listing points at a page the session cannot load.
            .with_search_results(
                "IONQ",
                &results_page(&[("https://finance.yahoo.com/news/missing.html", "1h ago")]),
            )
            .with_search_results("Solana", &results_page(&[(good_url, "1h ago")]))
            .with_page(good_url, ARTICLE);

        let p = pipeline(FakeSummarizer::returning("ok", Sentiment::Neutral), dir.path());
        let report = p.run(&mut session, &topics(&["IONQ", "Solana"])).await;

        assert_eq!(report[0].topic, "IONQ");
        assert_eq!(report[0].summary, COLLECTION_FAILED);
        assert_eq!(report[0].sentiment, Sentiment::Unknown);
        assert_eq!(report[1].sentiment, Sentiment::Neutral);
        assert_eq!(p.summarizer.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_listing_skips_summarizer() {
        let dir = tempdir().unwrap();
        let mut session = FakeSession::default().with_search_results(
            "Solana",
            &results_page(&[("https://finance.yahoo.com/news/old.html", "3d ago")]),
        );

        let p = pipeline(FakeSummarizer::returning("X", Sentiment::Bullish), dir.path());
        let report = p.run(&mut session, &topics(&["Solana"])).await;

        assert_eq!(report[0].summary, NO_RECENT_ARTICLES);
        assert!(p.summarizer.calls.borrow().is_empty());
        assert_eq!(session.visited.len(), 1);
    }

    #[tokio::test]
    async fn test_candidates_visited_in_rank_order_and_capped() {
        let dir = tempdir().unwrap();
        let urls: Vec<String> = (0..6)
            .map(|i| format!("https://finance.yahoo.com/news/{i}.html"))
            .collect();
        let cards: Vec<(&str, &str)> = urls.iter().map(|u| (u.as_str(), "1h ago")).collect();

        let mut session = FakeSession::default().with_search_results("Solana", &results_page(&cards));
        for url in &urls {
            session = session.with_page(url, ARTICLE);
        }

        let p = pipeline(FakeSummarizer::returning("X", Sentiment::Bullish), dir.path());
        p.run(&mut session, &topics(&["Solana"])).await;

        assert_eq!(session.visited.len(), 5);
        assert_eq!(&session.visited[1..], &urls[..4]);
        assert_eq!(p.summarizer.calls.borrow()[0].1.len(), 4);
    }

    #[tokio::test]
    async fn test_unreadable_record_is_recomputed_and_replaced() {
        let dir = tempdir().unwrap();
        let article_url = "https://finance.yahoo.com/news/solana-etf.html";
        let p = pipeline(FakeSummarizer::returning("Fresh take", Sentiment::Neutral), dir.path());
        std::fs::write(p.cache.record_path("Solana"), "{\"summary\": \"cut off").unwrap();

        let mut session = FakeSession::default()
            .with_search_results("Solana", &results_page(&[(article_url, "2h ago")]))
            .with_page(article_url, ARTICLE);
        let report = p.run(&mut session, &topics(&["Solana"])).await;

        assert_eq!(report[0].summary, "Fresh take");
        assert_eq!(report[0].sentiment, Sentiment::Neutral);
        assert_eq!(session.visited.len(), 2);
        assert_eq!(p.summarizer.calls.borrow().len(), 1);
        assert_eq!(p.cache.load("Solana").await.unwrap(), Some(report[0].clone()));
    }
}
