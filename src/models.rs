//! Data models shared by the harvesting, extraction and analysis stages.
//!
//! - [`Article`]: normalized text of one visited article page
//! - [`Candidate`]: an article location discovered on a listing page
//! - [`ListingEntry`]: one raw entry of a listing page, before harvesting
//! - [`Analysis`]: what the summarizer returns for a topic
//! - [`TopicResult`]: the per-topic record that is cached and reported

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when an article page exposes no title element.
pub const NO_TITLE: &str = "No title";

/// Body used when an article page exposes no content container.
pub const NO_CONTENT: &str = "No content";

/// A single article as extracted from its rendered page.
///
/// `body` holds the non-empty paragraph texts in document order, joined
/// with newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// The article headline, or [`NO_TITLE`].
    pub title: String,
    /// The article text, or [`NO_CONTENT`].
    pub body: String,
}

/// An absolute article URL found while harvesting a listing.
///
/// `rank` is the position in the harvested sequence (0 = most recent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub rank: usize,
}

/// One entry of a listing page as exposed by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    /// Raw `href` of the entry's article link, if any.
    pub link: Option<String>,
    /// Raw recency text, e.g. `"TheStreet • 3h ago"` or `"Oct 20, 2025"`.
    /// `Some("")` when the marker element exists but is blank.
    pub recency: Option<String>,
}

/// Market sentiment attached to a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl Sentiment {
    /// Map a free-form label to a sentiment.
    ///
    /// Matching is case-insensitive and ignores surrounding punctuation, so
    /// `"Bullish."` and `"[bearish]"` are recognized. Anything else is
    /// [`Sentiment::Unknown`].
    pub fn from_label(label: &str) -> Self {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match cleaned.as_str() {
            "bullish" => Sentiment::Bullish,
            "bearish" => Sentiment::Bearish,
            "neutral" => Sentiment::Neutral,
            _ => Sentiment::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
            Sentiment::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The summarizer's verdict over a topic's articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub summary: String,
    pub sentiment: Sentiment,
}

/// The outcome of processing one topic.
///
/// One is produced per topic per run, either fresh from the summarizer,
/// loaded from the daily cache, or degraded after a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic: String,
    pub summary: String,
    pub sentiment: Sentiment,
}

impl TopicResult {
    pub fn from_analysis(topic: &str, analysis: Analysis) -> Self {
        Self {
            topic: topic.to_string(),
            summary: analysis.summary,
            sentiment: analysis.sentiment,
        }
    }

    /// A degraded result standing in for a topic that could not be processed.
    pub fn degraded(topic: &str, summary: &str) -> Self {
        Self {
            topic: topic.to_string(),
            summary: summary.to_string(),
            sentiment: Sentiment::Unknown,
        }
    }
}
