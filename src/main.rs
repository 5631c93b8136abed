//! # Topic Digest
//!
//! Harvests recent articles about a list of topics from a news site's search
//! results, summarizes each topic's articles through an LLM, and delivers the
//! resulting digest to Telegram (or stdout).
//!
//! ## Usage
//!
//! ```sh
//! topic_digest -t Solana -t IONQ --days-back 2
//! ```
//!
//! ## Architecture
//!
//! For each topic, in order:
//! 1. **Cache**: reuse today's result if the topic was already analyzed
//! 2. **Harvesting**: search the source and keep the newest in-window links
//! 3. **Extraction**: visit each link and read title and body
//! 4. **Analysis**: summarize all of the topic's articles in one LLM call
//!
//! Then the per-topic results are delivered as one report. Everything runs
//! sequentially over a single browsing session.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cache;
mod cli;
mod config;
mod models;
mod notify;
mod outputs;
mod pipeline;
mod recency;
mod scrapers;
mod session;
mod utils;

use api::LlmSummarizer;
use cache::TopicCache;
use cli::Cli;
use config::RunConfig;
use notify::{Channel, deliver};
use outputs::json;
use pipeline::Pipeline;
use session::HttpSession;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("topic_digest starting up");

    // Load .env if present; real environment variables win.
    let _ = dotenvy::dotenv();

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.topics, ?args.source, "Parsed CLI arguments");

    // ---- Setup: any failure here aborts before a topic is touched ----
    let run_config = RunConfig::load(&args).await?;
    info!(
        source = %run_config.source,
        topics = ?run_config.topics,
        days_back = run_config.window().days_back(),
        max_articles = run_config.max_articles,
        "Run configuration ready"
    );

    if let Err(e) = ensure_writable_dir(&run_config.cache_dir).await {
        error!(
            path = %run_config.cache_dir.display(),
            error = %e,
            "Cache directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let summarizer = LlmSummarizer::load(args.llm_config.as_deref(), &args.template).await?;
    let channel = Channel::from_credentials(args.telegram_bot_token.clone(), args.telegram_chat_id.clone());

    let source = run_config.source.build();
    let cache = TopicCache::new(&run_config.cache_dir, source.name());
    let pipeline = Pipeline::new(
        source,
        summarizer,
        cache,
        run_config.window(),
        run_config.max_articles,
    );

    let mut session = match HttpSession::open(run_config.page_timeout()) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Could not establish browsing session; aborting run");
            return Err(e);
        }
    };

    // ---- Per-topic processing ----
    let report = pipeline.run(&mut session, &run_config.topics).await;
    session.close();

    // ---- Outputs ----
    if let Some(report_dir) = &args.report_dir {
        if let Err(e) = json::write_report(
            &report,
            pipeline.source_name(),
            Path::new(report_dir),
            Local::now(),
        )
        .await
        {
            error!(error = %e, "Failed to write JSON report");
        }
    }

    deliver(&channel, &report).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        topics = report.len(),
        "Execution complete"
    );

    Ok(())
}
