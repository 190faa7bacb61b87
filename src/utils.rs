//! Utility functions for string shortening and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Char-safe truncation for logs and rendered excerpts
//! - File system validation for the cache directory

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Byte offset of the `max_chars`-th character, or `None` if `s` is shorter.
fn char_boundary(s: &str, max_chars: usize) -> Option<usize> {
    s.char_indices().nth(max_chars).map(|(idx, _)| idx)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and a count
/// of the dropped bytes appended. Cuts always land on a char boundary, so
/// Vietnamese text is safe to pass in.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match char_boundary(s, max) {
        None => s.to_string(),
        Some(cut) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// First `max_chars` characters of `s`, with `…` when something was cut.
pub fn excerpt(s: &str, max_chars: usize) -> String {
    match char_boundary(s, max_chars) {
        None => s.to_string(),
        Some(cut) => format!("{}…", s[..cut].trim_end()),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Cache directory is writable");
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
    fn test_truncate_for_log_multibyte() {
        // 'ờ' is three bytes; a byte-indexed cut would split it.
        let result = truncate_for_log("Thời sự", 2);
        assert_eq!(result, "Th…(+9 bytes)");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("Tin nóng", 20), "Tin nóng");
        assert_eq!(excerpt("Tin nóng hôm nay", 8), "Tin nóng…");
        assert_eq!(excerpt("Tin nóng", 4), "Tin…");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_rejects_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_writable_dir(&file).await.is_err());
    }
}
