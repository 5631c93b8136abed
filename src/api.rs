//! LLM-backed summarization of a topic's articles.
//!
//! All articles harvested for a topic are folded into one prompt. The model
//! answers in a line-prefixed format:
//!
//! ```text
//! Summary: Solana climbed after ...
//! continued summary text ...
//!
//! Sentiment: bullish
//! ```
//!
//! [`parse_reply`] turns that text into an [`Analysis`]. Only the literal,
//! case-sensitive prefixes `Summary:` and `Sentiment:` start a section.
//!
//! # Architecture
//!
//! - [`Summarizer`]: what the pipeline calls
//! - [`LlmSummarizer`]: sends the prompt through `awful_aj::api::ask`
//!
//! Each topic gets a single attempt; a failed call degrades that topic only.

use crate::models::{Analysis, Article, Sentiment};
use crate::utils::truncate_for_log;
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::error::Error;
use std::fmt::Write;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const SUMMARY_PREFIX: &str = "Summary:";
const SENTIMENT_PREFIX: &str = "Sentiment:";

/// Produces a summary and sentiment for a topic's articles.
pub trait Summarizer {
    async fn summarize(&self, topic: &str, articles: &[Article]) -> Result<Analysis, Box<dyn Error>>;
}

/// [`Summarizer`] backed by an OpenAI-compatible endpoint via `awful_aj`.
#[derive(Debug)]
pub struct LlmSummarizer {
    /// Endpoint, API key and model settings.
    config: AwfulJadeConfig,
    /// Chat template carrying the analyst system prompt.
    template: ChatTemplate,
}

impl LlmSummarizer {
    pub fn new(config: AwfulJadeConfig, template: ChatTemplate) -> Self {
        Self { config, template }
    }

    /// Load the LLM config and the named chat template.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Path to an `awful_aj` config file; defaults to
    ///   `config.yaml` in the `awful_aj` config dir
    /// * `template_name` - Name of the chat template to load
    ///
    /// # Errors
    ///
    /// Fails if the config dir cannot be resolved, the config file cannot be
    /// read or parsed, or the template does not exist.
    #[instrument(level = "info", skip_all, fields(template = template_name))]
    pub async fn load(config_path: Option<&str>, template_name: &str) -> Result<Self, Box<dyn Error>> {
        let config_path = match config_path {
            Some(path) => path.to_string(),
            None => awful_aj::config_dir()?
                .join("config.yaml")
                .to_string_lossy()
                .into_owned(),
        };
        let config = awful_aj::config::load_config(&config_path)?;
        info!(%config_path, "Loaded LLM configuration");
        let template = awful_aj::template::load_template(template_name).await?;
        info!("Loaded chat template");
        Ok(Self::new(config, template))
    }
}

impl Summarizer for LlmSummarizer {
    #[instrument(level = "info", skip(self, articles), fields(articles = articles.len()))]
    async fn summarize(&self, topic: &str, articles: &[Article]) -> Result<Analysis, Box<dyn Error>> {
        let prompt = build_prompt(topic, articles);
        let t0 = Instant::now();
        let reply = match ask(&self.config, prompt, &self.template, None, None).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "API call failed");
                return Err(e);
            }
        };
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            reply = %truncate_for_log(&reply, 300),
            "Model replied"
        );
        Ok(parse_reply(&reply))
    }
}

/// The analysis prompt for `topic` over all of its articles.
pub fn build_prompt(topic: &str, articles: &[Article]) -> String {
    let mut combined = String::new();
    for (i, article) in articles.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(
            combined,
            "\n\nArticle {}:\nTitle: {}\nContent: {}\n",
            i + 1,
            article.title,
            article.body
        );
    }

    format!(
        "Analyze the following collection of recent articles about {topic}:\n\
         {combined}\n\n\
         Please provide:\n\
         1. A one-paragraph summary no more than 400 words MAX that synthesizes the key themes and information across ALL articles\n\
         2. An overall sentiment analysis for stock evaluation (bullish/bearish/neutral) with reasoning\n\n\
         Format your response as:\n\
         Summary: [your summary here]\n\n\
         Sentiment: [bullish/bearish/neutral]\n"
    )
}

/// Split a line-prefixed reply into summary and sentiment.
///
/// Lines are trimmed. A `Summary:` line opens the summary; following
/// non-empty lines are appended with a single space until another prefix
/// appears. A `Sentiment:` line sets the sentiment label. Text before the
/// first prefix is ignored.
pub fn parse_reply(reply: &str) -> Analysis {
    enum Section {
        None,
        Summary,
        Sentiment,
    }

    let mut summary = String::new();
    let mut sentiment = String::new();
    let mut section = Section::None;

    for line in reply.trim().lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(SUMMARY_PREFIX) {
            section = Section::Summary;
            summary = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(SENTIMENT_PREFIX) {
            section = Section::Sentiment;
            sentiment = rest.trim().to_string();
        } else if !line.is_empty() && matches!(section, Section::Summary) {
            if !summary.is_empty() {
                summary.push(' ');
            }
            summary.push_str(line);
        }
    }

    Analysis {
        summary: summary.trim().to_string(),
        sentiment: Sentiment::from_label(&sentiment),
    }
}
