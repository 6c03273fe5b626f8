//! Extracted-text normalization.
//!
//! Every extractor output passes through [`clean_extracted_text`] before it
//! is persisted or embedded: whitespace runs collapse to single spaces,
//! characters outside the permitted set are stripped, and the result is
//! capped at [`defaults::EXTRACTED_TEXT_CAP`] characters with a truncation
//! marker.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Permitted characters: ASCII word characters, whitespace, common
/// punctuation, and the Latin-1 Supplement / Latin Extended / Greek /
/// Cyrillic ranges. Everything else (control bytes, emoji, stray glyphs
/// from binary parsers) is stripped.
static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"[^0-9A-Za-z_\s.,!?;:'"()\[\]{}@#$%&*+=/\\|<>~^\x{00C0}-\x{024F}\x{0370}-\x{03FF}\x{0400}-\x{04FF}-]"#,
    )
    .unwrap()
});

/// Normalize extracted text for storage and embedding.
pub fn clean_extracted_text(raw: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw, " ");
    let stripped = DISALLOWED.replace_all(&collapsed, "");
    // Stripping can leave adjacent spaces behind; collapse once more.
    let cleaned = WHITESPACE_RUN.replace_all(&stripped, " ");
    let cleaned = cleaned.trim();

    truncate_with_marker(cleaned, defaults::EXTRACTED_TEXT_CAP)
}

/// Truncate `text` to at most `cap` characters, appending the truncation
/// marker when anything was cut.
pub fn truncate_with_marker(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let mut out: String = text.chars().take(cap).collect();
    out.push_str(defaults::TRUNCATION_MARKER);
    out
}

/// Truncate `text` to at most `budget` characters at a char boundary,
/// without a marker. Used for provider input budgets.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            clean_extracted_text("hello   world\n\nnext\t\tline"),
            "hello world next line"
        );
    }

    #[test]
    fn strips_control_and_emoji() {
        assert_eq!(
            clean_extracted_text("report\u{0000} ready \u{1F600} now"),
            "report ready now"
        );
    }

    #[test]
    fn keeps_common_punctuation() {
        let input = "Total: $1,234.56 (net); see notes [3], ok?";
        let cleaned = clean_extracted_text(input);
        assert!(cleaned.contains("$1,234.56"));
        assert!(cleaned.contains("(net);"));
        assert!(cleaned.contains("[3]"));
        assert!(cleaned.ends_with("ok?"));
    }

    #[test]
    fn keeps_extended_latin_and_cyrillic() {
        let cleaned = clean_extracted_text("café naïve żółć привет λόγος");
        assert!(cleaned.contains("café"));
        assert!(cleaned.contains("привет"));
        assert!(cleaned.contains("λόγος"));
    }

    #[test]
    fn truncates_at_cap_with_marker() {
        let long = "a".repeat(defaults::EXTRACTED_TEXT_CAP + 100);
        let cleaned = clean_extracted_text(&long);
        assert_eq!(
            cleaned.chars().count(),
            defaults::EXTRACTED_TEXT_CAP + defaults::TRUNCATION_MARKER.chars().count()
        );
        assert!(cleaned.ends_with(defaults::TRUNCATION_MARKER));
    }

    #[test]
    fn short_text_is_untouched_by_cap() {
        assert_eq!(clean_extracted_text("short text"), "short text");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_extracted_text(""), "");
        assert_eq!(clean_extracted_text("   \n\t  "), "");
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
