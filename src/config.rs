//! Run configuration: the optional YAML run file merged with CLI overrides.
//!
//! ```yaml
//! source: yahoo_finance
//! topics: [Solana, IONQ]
//! days_back: 1
//! max_articles: 4
//! cache_dir: cache
//! page_timeout_secs: 10
//! ```
//!
//! Every key is optional. `days_back` is validated on load, so a run file
//! with `days_back: 0` is rejected before anything else happens.

use crate::cli::Cli;
use crate::recency::RecencyWindow;
use crate::scrapers::SourceKind;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub source: SourceKind,
    pub topics: Vec<String>,
    pub days_back: RecencyWindow,
    pub max_articles: usize,
    pub cache_dir: PathBuf,
    pub page_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::YahooFinance,
            topics: vec!["Solana".to_string()],
            days_back: RecencyWindow::TODAY,
            max_articles: 4,
            cache_dir: PathBuf::from("cache"),
            page_timeout_secs: 10,
        }
    }
}

impl RunConfig {
    /// Parse a run file's contents.
    pub fn from_yaml(yaml: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load the run file named on the command line (if any) and apply the
    /// command-line overrides on top.
    #[instrument(level = "info", skip_all, fields(config = ?cli.config))]
    pub async fn load(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let base = match &cli.config {
            Some(path) => {
                let yaml = tokio::fs::read_to_string(path).await?;
                info!(%path, "Loaded run file");
                Self::from_yaml(&yaml)?
            }
            None => Self::default(),
        };
        base.with_overrides(cli)
    }

    /// Apply command-line values over this configuration.
    pub fn with_overrides(mut self, cli: &Cli) -> Result<Self, Box<dyn Error>> {
        if let Some(source) = cli.source {
            self.source = source;
        }
        if !cli.topics.is_empty() {
            self.topics = cli.topics.clone();
        }
        if let Some(days_back) = cli.days_back {
            self.days_back = RecencyWindow::new(days_back)?;
        }
        if let Some(max_articles) = cli.max_articles {
            self.max_articles = max_articles;
        }
        if let Some(cache_dir) = &cli.cache_dir {
            self.cache_dir = PathBuf::from(cache_dir);
        }
        if let Some(secs) = cli.page_timeout_secs {
            self.page_timeout_secs = secs;
        }
        Ok(self)
    }

    pub fn window(&self) -> RecencyWindow {
        self.days_back
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}
