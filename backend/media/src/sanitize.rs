//! Filename sanitizer: turns captions into filesystem-safe base names.
//!
//! Unicode is kept as is; only characters rejected by common filesystems are dropped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default maximum base-name length, in characters.
pub const MAX_FILENAME_CHARS: usize = 100;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const TRAILING_JUNK: [char; 3] = ['_', '.', ' '];

/// Sanitize `text` with the default length limit, falling back to `default`.
pub fn sanitize_filename(text: &str, default: &str) -> String {
    sanitize_filename_with(text, default, MAX_FILENAME_CHARS)
}

pub fn sanitize_filename_with(text: &str, default: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return default.to_string();
    }

    let stripped = UNSAFE_CHARS.replace_all(trimmed, "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, "_");
    let cleaned = collapsed
        .trim_start_matches(['.', ' '])
        .trim_end_matches(TRAILING_JUNK);

    let result = if cleaned.chars().count() > max_chars {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        truncated.trim_end_matches(TRAILING_JUNK).to_string()
    } else {
        cleaned.to_string()
    };

    if result.is_empty() {
        default.to_string()
    } else {
        result
    }
}
