//! Delivery of the aggregate report.
//!
//! The report is rendered once by [`format_report`] and handed to a
//! [`Notifier`]. Delivery is best-effort: [`deliver`] logs a failure and
//! moves on.

use crate::models::{Sentiment, TopicResult};
use chrono::Local;
use itertools::Itertools;
use reqwest::Client;
use std::error::Error;
use tracing::{error, info, instrument, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";
const HEADER: &str = "📊 *Market Analysis Summary*";
/// Telegram rejects messages longer than 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4000;

/// A channel the aggregate report can be sent to.
pub trait Notifier {
    async fn notify(&self, report: &[TopicResult]) -> Result<(), Box<dyn Error>>;
}

/// Sends the report as Markdown messages through a Telegram bot, split
/// between topics when it is too long for one message.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            chat_id,
        }
    }
}

impl Notifier for TelegramNotifier {
    #[instrument(level = "info", skip_all, fields(topics = report.len()))]
    async fn notify(&self, report: &[TopicResult]) -> Result<(), Box<dyn Error>> {
        if report.is_empty() {
            warn!("Empty report; nothing to send");
            return Ok(());
        }

        let messages = telegram_messages(report, &timestamp(), MAX_MESSAGE_CHARS);
        let total = messages.len();
        let mut failed = 0;
        for (part, text) in messages.iter().enumerate() {
            if let Err(e) = self.send(text).await {
                error!(part = part + 1, total, error = %e, "Failed to send message");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(format!("{failed} of {total} Telegram messages failed").into());
        }
        info!(messages = total, "Report sent to Telegram");
        Ok(())
    }
}

impl TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), Box<dyn Error>> {
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API, self.bot_token);
        let response = self
            .client
            .post(url)
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", text),
                ("parse_mode", "Markdown"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Telegram returned {status}: {body}").into());
        }
        Ok(())
    }
}

/// Prints the report to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    async fn notify(&self, report: &[TopicResult]) -> Result<(), Box<dyn Error>> {
        if report.is_empty() {
            warn!("Empty report; nothing to print");
            return Ok(());
        }
        println!("{}", format_report(report, &timestamp()));
        Ok(())
    }
}

/// The notifier chosen at startup.
#[derive(Debug, Clone)]
pub enum Channel {
    Telegram(TelegramNotifier),
    Console(ConsoleNotifier),
}

impl Channel {
    /// Telegram when both credentials are present, the console otherwise.
    pub fn from_credentials(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        match (bot_token, chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Channel::Telegram(TelegramNotifier::new(token, chat))
            }
            _ => Channel::Console(ConsoleNotifier),
        }
    }
}

impl Notifier for Channel {
    async fn notify(&self, report: &[TopicResult]) -> Result<(), Box<dyn Error>> {
        match self {
            Channel::Telegram(n) => n.notify(report).await,
            Channel::Console(n) => n.notify(report).await,
        }
    }
}

/// Deliver `report`, logging instead of failing.
pub async fn deliver<N: Notifier>(notifier: &N, report: &[TopicResult]) -> bool {
    match notifier.notify(report).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Failed to deliver report");
            false
        }
    }
}

fn sentiment_emoji(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Bullish => "📈",
        Sentiment::Bearish => "📉",
        Sentiment::Neutral => "➡️",
        Sentiment::Unknown => "",
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn section(result: &TopicResult, topic: &str, summary: &str) -> String {
    format!(
        "\n*{}* {}\nSentiment: {}\n{}\n\n{}",
        topic,
        sentiment_emoji(result.sentiment),
        result.sentiment.as_str().to_uppercase(),
        summary,
        "─".repeat(30)
    )
}

/// Render the report as one Markdown message, text left as is.
pub fn format_report(report: &[TopicResult], generated_at: &str) -> String {
    let sections = report
        .iter()
        .map(|r| section(r, &r.topic, &r.summary))
        .join("\n");

    format!("{HEADER}\n\n{sections}\n\n_Generated at {generated_at}_")
}

/// Backslash-escape the characters Telegram's legacy Markdown treats as
/// entity delimiters.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render the report as Telegram messages of at most `max_chars` characters.
///
/// Topic names and summaries are escaped. Sections are packed into messages
/// in topic order, a message only breaks between sections, and a section too
/// long for any message is cut into `max_chars` pieces. The header opens the
/// first message and the footer closes the last.
pub fn telegram_messages(report: &[TopicResult], generated_at: &str, max_chars: usize) -> Vec<String> {
    let footer = format!("\n\n_Generated at {}_", escape_markdown(generated_at));
    let mut messages = Vec::new();
    let mut current = HEADER.to_string();

    let sections = report
        .iter()
        .map(|r| section(r, &escape_markdown(&r.topic), &escape_markdown(&r.summary)));
    for block in sections {
        let piece = format!("\n{block}");
        if char_len(&current) + char_len(&piece) <= max_chars {
            current.push_str(&piece);
            continue;
        }
        if !current.is_empty() {
            messages.push(std::mem::take(&mut current));
        }
        let block = block.trim_start();
        if char_len(block) <= max_chars {
            current.push_str(block);
        } else {
            let mut pieces = split_chars(block, max_chars);
            current = pieces.pop().unwrap_or_default();
            messages.extend(pieces);
        }
    }

    if char_len(&current) + char_len(&footer) > max_chars {
        messages.push(std::mem::take(&mut current));
        current.push_str(footer.trim_start());
    } else {
        current.push_str(&footer);
    }
    messages.push(current);
    messages
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_chars(text: &str, max_chars: usize) -> Vec<String> {
    text.chars()
        .chunks(max_chars.max(1))
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect()
}
