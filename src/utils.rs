//! Utility functions for slugs, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the pipeline:
//! - Slug derivation for article URLs
//! - Capitalization for fallback titles
//! - String truncation and JSON error classification for logging model replies
//! - Directory probing and write-then-rename file replacement

use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use tracing::{debug, info, instrument};

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug regex"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid regex"));

/// Convert an article title to a URL-safe slug.
///
/// Lowercases the title, drops everything that is not an ASCII letter,
/// ASCII digit, whitespace or hyphen, turns whitespace runs into single hyphens, folds
/// repeated hyphens and trims hyphens from both ends.
///
/// Slugs are not unique: two articles with the same title share a slug.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(create_slug("The Best Serum!!"), "the-best-serum");
/// assert_eq!(create_slug("  Yoga -- for   Beginners "), "yoga-for-beginners");
/// ```
pub fn create_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Capitalize the first character of a string.
///
/// Used for category names in fallback titles (e.g., "beauty" -> "Beauty").
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` characters are cut and suffixed with the number
/// of bytes dropped.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A reply cut off by the model's token limit fails with an EOF error; the
/// generation client logs those separately from plain malformed output.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and removes a
/// probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::write(&probe_path, b"").await?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Directory is writable");
    Ok(())
}

/// Replace `path` with `contents`.
///
/// The bytes land in a `.tmp` sibling first and are renamed over the target,
/// so readers never observe a half-written file.
pub async fn write_replacing(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
    Ok(())
}
