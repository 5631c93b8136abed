//! Command-line interface definitions for Topic Digest.
//!
//! Every option overrides the corresponding value of the optional YAML run
//! file. Secrets can also come from the environment (or a `.env` file).

use crate::scrapers::SourceKind;
use clap::Parser;

/// Command-line arguments for the Topic Digest application.
///
/// # Examples
///
/// ```sh
/// # Today's Yahoo Finance news for two tickers
/// topic_digest -t Solana -t IONQ
///
/// # Everything from a run file, looking back three days
/// topic_digest --config digest.yaml --days-back 3
///
/// # CryptoPotato, results also written as JSON
/// topic_digest --source crypto-potato -t Solana --report-dir ./reports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML run file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Topic to search for (repeatable)
    #[arg(short, long = "topic")]
    pub topics: Vec<String>,

    /// News source to harvest
    #[arg(short, long, value_enum)]
    pub source: Option<SourceKind>,

    /// How many days back an article may be (1 = today only)
    #[arg(short, long)]
    pub days_back: Option<u32>,

    /// Maximum number of articles to read per topic
    #[arg(long)]
    pub max_articles: Option<usize>,

    /// Directory holding the daily cache
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Page load timeout in seconds
    #[arg(long)]
    pub page_timeout_secs: Option<u64>,

    /// Also write the aggregate report as JSON into this directory
    #[arg(short, long)]
    pub report_dir: Option<String>,

    /// Path to the LLM config.yaml (defaults to the awful_aj config dir)
    #[arg(long)]
    pub llm_config: Option<String>,

    /// Name of the chat template used for summarization
    #[arg(long, default_value = "topic_summary")]
    pub template: String,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat ID
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,
}
