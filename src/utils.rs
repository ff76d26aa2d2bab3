//! Small string helpers shared by the extractor, the reader and the renderer.
//!
//! All truncation here counts `char`s, never bytes, so Korean text is never
//! cut through the middle of a code point.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run (including newlines and NBSP) to one space and trim.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    RE_WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Cut `s` to at most `max` characters, appending `suffix` only when something was cut.
pub fn truncate_chars(s: &str, max: usize, suffix: &str) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}{}", &s[..byte_idx], suffix),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the
/// number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}…(+{} bytes)", &s[..byte_idx], s.len() - byte_idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("a\u{00A0}\u{00A0}b"), "a b");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_truncate_chars_exact_limit_is_untouched() {
        let s = "가".repeat(300);
        assert_eq!(truncate_chars(&s, 300, "..."), s);
    }

    #[test]
    fn test_truncate_chars_cuts_on_char_boundary() {
        let s = "가".repeat(301);
        let out = truncate_chars(&s, 300, "...");
        assert_eq!(out.chars().count(), 303);
        assert!(out.ends_with("가..."));
    }

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
}
