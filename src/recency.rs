//! Recency classification for listing dates.
//!
//! Listings expose publication dates in several shapes: relative markers
//! (`"just now"`, `"3h ago"`, `"5 hours ago"`, `"2d ago"`, `"1 day ago"`) and
//! absolute dates (`"Oct 20, 2025"`). [`is_within_window`] folds all of them
//! into one predicate against a [`RecencyWindow`].
//!
//! # Split policy
//!
//! Raw text may carry a source attribution before a bullet, as in
//! `"TheStreet • 3h ago"`. The classifier itself keeps only the segment after
//! the last `•`, so callers can pass either the full text or the bare marker.
//!
//! # Failure mode
//!
//! Anything that cannot be parsed is treated as outside the window. Weeks,
//! months and years fall into that bucket too.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::error::Error;
use std::fmt;

static MINUTE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:just now|(?:\d+|an?)\s*(?:m|min|mins|minute|minutes)\s+ago)$")
        .expect("minute marker regex")
});

static HOUR_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+|an?)\s*(?:h|hr|hrs|hour|hours)\s+ago$").expect("hour marker regex")
});

static DAY_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<n>\d+|an?)\s*(?:d|day|days)\s+ago$").expect("day marker regex")
});

const ABSOLUTE_FORMATS: [&str; 2] = ["%b %d, %Y", "%B %d, %Y"];

/// How far back an article may have been published and still count as recent.
///
/// `1` means "today only", `N` means "within the last N days".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub struct RecencyWindow {
    days_back: u32,
}

/// Returned when a window of zero days is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidWindow(pub u32);

impl fmt::Display for InvalidWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "days_back must be at least 1 (got {})", self.0)
    }
}

impl Error for InvalidWindow {}

impl RecencyWindow {
    /// Today only.
    pub const TODAY: RecencyWindow = RecencyWindow { days_back: 1 };

    pub fn new(days_back: u32) -> Result<Self, InvalidWindow> {
        if days_back == 0 {
            return Err(InvalidWindow(days_back));
        }
        Ok(Self { days_back })
    }

    pub fn days_back(&self) -> u32 {
        self.days_back
    }

    /// Whether an article `days_ago` days old falls inside the window.
    pub fn contains_day_offset(&self, days_ago: i64) -> bool {
        (0..i64::from(self.days_back)).contains(&days_ago)
    }

    /// Human description used in logs: `"today"` or `"last N days"`.
    pub fn describe(&self) -> String {
        if self.days_back == 1 {
            "today".to_string()
        } else {
            format!("last {} days", self.days_back)
        }
    }
}

impl TryFrom<u32> for RecencyWindow {
    type Error = InvalidWindow;

    fn try_from(days_back: u32) -> Result<Self, Self::Error> {
        RecencyWindow::new(days_back)
    }
}

/// Whether `raw` describes a publication time inside `window`, relative to
/// the local calendar date.
pub fn is_within_window(raw: &str, window: RecencyWindow) -> bool {
    is_within_window_on(raw, window, Local::now().date_naive())
}

/// Same as [`is_within_window`] with an explicit reference date.
pub fn is_within_window_on(raw: &str, window: RecencyWindow, today: NaiveDate) -> bool {
    let segment = marker_segment(raw);
    let folded = segment.to_lowercase();

    // Minute and hour markers are same-day regardless of the window.
    if MINUTE_MARKER.is_match(&folded) || HOUR_MARKER.is_match(&folded) {
        return true;
    }

    if let Some(caps) = DAY_MARKER.captures(&folded) {
        return match parse_count(&caps["n"]) {
            Some(days_ago) => days_ago < u64::from(window.days_back),
            None => false,
        };
    }

    match parse_absolute(segment) {
        Some(date) => window.contains_day_offset((today - date).num_days()),
        None => false,
    }
}

/// The trimmed text after the last bullet separator.
fn marker_segment(raw: &str) -> &str {
    raw.rsplit('•').next().unwrap_or(raw).trim()
}

fn parse_count(n: &str) -> Option<u64> {
    match n {
        "a" | "an" => Some(1),
        digits => digits.parse().ok(),
    }
}

fn parse_absolute(segment: &str) -> Option<NaiveDate> {
    ABSOLUTE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(segment, fmt).ok())
}
