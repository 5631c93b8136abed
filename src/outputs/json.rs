//! JSON output of the aggregate report.
//!
//! Each run writes one file under a directory named after the local date,
//! so several runs on the same day sit next to each other.

use crate::models::TopicResult;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialized form of one run's report.
#[derive(Debug, Serialize)]
pub struct ReportFile<'a> {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run in `HH:MM:SS` format.
    pub local_time: String,
    /// The news source the topics were harvested from.
    pub source: &'a str,
    /// Per-topic results in configured topic order.
    pub topics: &'a [TopicResult],
}

/// Serialize one run's report to a dated JSON file.
///
/// # Arguments
///
/// * `report` - Per-topic results in topic order
/// * `source` - Name of the source the topics were harvested from
/// * `report_dir` - Base directory for reports
/// * `now` - Local time of the run, used for the directory and file name
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
///
/// # Output Path
///
/// The file is written to: `{report_dir}/{date}/report_{HHMMSS}.json`
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir.display()))]
pub async fn write_report(
    report: &[TopicResult],
    source: &str,
    report_dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, Box<dyn Error>> {
    let file = ReportFile {
        local_date: now.format("%Y-%m-%d").to_string(),
        local_time: now.format("%H:%M:%S").to_string(),
        source,
        topics: report,
    };
    let json = serde_json::to_string_pretty(&file)?;

    let full_dir = report_dir.join(&file.local_date);
    info!(full_dir = %full_dir.display(), "Ensuring report directory exists");
    if let Err(e) = fs::create_dir_all(&full_dir).await {
        error!(full_dir = %full_dir.display(), error = %e, "Failed to create report dir");
        return Err(e.into());
    }

    let path = full_dir.join(format!("report_{}.json", now.format("%H%M%S")));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(path)
}
