//! Per-topic, per-day cache of analysis results.
//!
//! Once a topic has been analyzed on a given calendar day, later runs on the
//! same day reuse the stored result instead of harvesting, extracting and
//! summarizing again.
//!
//! # Layout
//!
//! ```text
//! cache_dir/
//! ├── yahoo_finance_solana_2025-10-20.json
//! └── yahoo_finance_ionq_2025-10-20.json
//! ```
//!
//! Each file holds `{"summary": "...", "sentiment": "..."}`. Records are
//! written to a `.tmp` sibling and renamed into place, so a crash mid-write
//! never leaves a partial record behind. Records from earlier days are left
//! where they are.
//!
//! The calendar day is the local date of the machine running the pipeline.

use crate::models::{Sentiment, TopicResult};
use crate::utils::slugify_topic;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument};

/// On-disk shape of a cache record.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    summary: String,
    sentiment: String,
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct TopicCache {
    dir: PathBuf,
    namespace: String,
    today: Clock,
}

impl fmt::Debug for TopicCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicCache")
            .field("dir", &self.dir)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl TopicCache {
    /// A cache rooted at `dir`, with keys prefixed by `namespace` (the source
    /// name) so different sources never share records.
    pub fn new(dir: impl Into<PathBuf>, namespace: &str) -> Self {
        Self {
            dir: dir.into(),
            namespace: namespace.to_string(),
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the clock that decides the calendar day.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    /// Path of the record for `topic` today.
    pub fn record_path(&self, topic: &str) -> PathBuf {
        let today = (self.today)();
        self.dir.join(format!(
            "{}_{}_{}.json",
            self.namespace,
            slugify_topic(topic),
            today.format("%Y-%m-%d")
        ))
    }

    /// Whether a record exists for `topic` today.
    pub async fn has(&self, topic: &str) -> bool {
        fs::try_exists(self.record_path(topic)).await.unwrap_or(false)
    }

    /// The record for `topic` today, or `None` if there is none.
    #[instrument(level = "info", skip(self))]
    pub async fn load(&self, topic: &str) -> Result<Option<TopicResult>, Box<dyn Error>> {
        let path = self.record_path(topic);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: CacheRecord = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded cache record");
        Ok(Some(TopicResult {
            topic: topic.to_string(),
            summary: record.summary,
            sentiment: Sentiment::from_label(&record.sentiment),
        }))
    }

    /// Write or overwrite the record for `topic` today.
    ///
    /// The record is written to `<record>.json.tmp` and then renamed over the
    /// final path, creating the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, directory creation, the write or the
    /// rename fails. The previous record, if any, is left intact.
    #[instrument(level = "info", skip(self, result))]
    pub async fn store(&self, topic: &str, result: &TopicResult) -> Result<(), Box<dyn Error>> {
        let path = self.record_path(topic);
        let record = CacheRecord {
            summary: result.summary.clone(),
            sentiment: result.sentiment.to_string(),
        };
        let json = serde_json::to_string_pretty(&record)?;

        fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        info!(path = %path.display(), "Stored cache record");
        Ok(())
    }
}
