//! The browsing session used to load listing and article pages.
//!
//! The pipeline only needs three things from a session: load a URL, submit a
//! search form, and hand back the current page as a parse tree. Page loads
//! are bounded by a fixed timeout; a load that does not finish in time is a
//! navigation failure.
//!
//! [`HttpSession`] is acquired once at startup with [`HttpSession::open`] and
//! released once with [`HttpSession::close`].

use crate::scrapers::SearchForm;
use reqwest::Client;
use scraper::Html;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// What the pipeline needs from a browsing session.
pub trait BrowsingSession {
    /// Load `url` and wait until the page is ready or the timeout elapses.
    async fn navigate(&mut self, url: &str) -> Result<(), Box<dyn Error>>;

    /// Submit `query` through a site's search form and load the results.
    async fn submit_query(&mut self, form: &SearchForm, query: &str) -> Result<(), Box<dyn Error>>;

    /// URL of the page currently loaded.
    fn current_url(&self) -> Option<&Url>;

    /// Parse tree of the page currently loaded.
    fn page(&self) -> Result<Html, Box<dyn Error>>;
}

/// A session backed by a single HTTP client.
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    current: Option<(Url, String)>,
    pages_loaded: usize,
}

impl HttpSession {
    /// Establish the session. Failure here aborts the run.
    #[instrument(level = "info", skip_all, fields(timeout_secs = page_timeout.as_secs()))]
    pub fn open(page_timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(page_timeout)
            .build()?;
        info!("Browsing session established");
        Ok(Self {
            client,
            current: None,
            pages_loaded: 0,
        })
    }

    /// Release the session.
    pub fn close(self) {
        info!(pages_loaded = self.pages_loaded, "Browsing session closed");
    }

    async fn load(&mut self, url: Url) -> Result<(), Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Page load returned non-success status");
            return Err(format!("GET {url} returned {status}").into());
        }
        let final_url = response.url().clone();
        let body = response.text().await?;
        info!(
            url = %final_url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Page loaded"
        );
        self.current = Some((final_url, body));
        self.pages_loaded += 1;
        Ok(())
    }
}

impl BrowsingSession for HttpSession {
    #[instrument(level = "info", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), Box<dyn Error>> {
        let url = Url::parse(url)?;
        self.load(url).await
    }

    #[instrument(level = "info", skip(self, form), fields(action = form.action))]
    async fn submit_query(&mut self, form: &SearchForm, query: &str) -> Result<(), Box<dyn Error>> {
        self.load(search_url(form, query)?).await
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|(url, _)| url)
    }

    fn page(&self) -> Result<Html, Box<dyn Error>> {
        match &self.current {
            Some((_, body)) => Ok(Html::parse_document(body)),
            None => Err("no page loaded".into()),
        }
    }
}

/// The GET URL a search form submits to for `query`.
pub fn search_url(form: &SearchForm, query: &str) -> Result<Url, Box<dyn Error>> {
    let mut url = Url::parse(form.action)?;
    url.query_pairs_mut().append_pair(form.field, query);
    Ok(url)
}
