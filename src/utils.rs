//! Utility functions for string handling and file system checks.
//!
//! - String truncation for logging long LLM replies
//! - Topic slugs for deterministic cache keys
//! - File system validation for the cache and report directories

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Normalize a topic into a file-name-safe identifier.
///
/// Lowercases the topic, keeps alphanumerics, `-` and `.`, and replaces every
/// other character with `_`. `"Bitcoin Cash"` becomes `"bitcoin_cash"` and
/// `"BRK.B"` stays distinct as `"brk.b"`.
///
/// Topics that differ only in case, or only in other punctuation and spaces
/// (`"BRK B"` and `"brk_b"`), share a slug and therefore a cache record.
pub fn slugify_topic(topic: &str) -> String {
    topic
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let s = "📈📈📈";
        let result = truncate_for_log(s, 5);
        assert!(result.starts_with("📈…"));
        assert!(result.contains("(+8 bytes)"));
    }

    #[test]
    fn test_slugify_topic() {
        assert_eq!(slugify_topic("Solana"), "solana");
        assert_eq!(slugify_topic("Bitcoin Cash"), "bitcoin_cash");
        assert_eq!(slugify_topic(" BRK.B "), "brk.b");
        assert_eq!(slugify_topic("BRK-B"), "brk-b");
        assert_eq!(slugify_topic("BRK B"), "brk_b");
        assert_eq!(slugify_topic("https://x.com/a"), "https___x.com_a");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("cache").join("nested");
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join("..__probe_write__").exists());
    }
}
