//! crates/docqa_core/src/normalize.rs
//!
//! Whitespace canonicalisation applied to every extracted text before it is stored.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid horizontal whitespace pattern"));

static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid blank line pattern"));

/// Collapses runs of spaces/tabs to one space, caps paragraph separation at a single
/// empty line and trims both ends.
///
/// Idempotent, and never touches non-whitespace characters or their order.
pub fn normalize(text: &str) -> String {
    let text = HORIZONTAL_RUN.replace_all(text, " ");
    let text = BLANK_LINE_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Removes C0 control characters other than tab, line feed and carriage return.
///
/// NUL in particular cannot be stored in a PostgreSQL `TEXT` column.
fn strip_control(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\0'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f'))
        .collect()
}

/// Normalized plain text: the single value type produced at the extractor boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlainText(String);

impl PlainText {
    /// Drops control characters, normalizes `raw` and wraps it.
    pub fn from_raw(raw: &str) -> Self {
        Self(normalize(&strip_control(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for PlainText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlainText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn collapses_spaces_and_blank_lines() {
        assert_eq!(normalize("Hello   world.\n\n\n\nBye."), "Hello world.\n\nBye.");
    }

    #[test]
    fn keeps_single_line_breaks_and_one_blank_line() {
        assert_eq!(normalize("a\nb\n\nc"), "a\nb\n\nc");
        assert_eq!(normalize("a\t\t b \n \t \n  \nc"), "a b \n\nc");
    }

    #[test]
    fn trims_both_ends() {
        assert_eq!(normalize("\n\n \t  text \n\n"), "text");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "Hello   world.\n\n\n\nBye.",
            "  lead\r\n\r\n\r\ntrail  ",
            "x \n \n \n y\t\tz",
            "para one\n  \n\t\npara two\n\n\n\n\npara three",
            "no whitespace at all",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn never_changes_visible_content() {
        let sample = "A  quick\t\tbrown\n\n\n\nfox\n \n jumps";
        let out = normalize(sample);
        assert_eq!(non_whitespace(&out), non_whitespace(sample));
        assert!(!out.contains("  "));
        assert!(!out.contains("\n\n\n"));
    }

    #[test]
    fn plain_text_wraps_normalized_content() {
        let text = PlainText::from_raw("  one   two \n\n\n three ");
        assert_eq!(text.as_str(), "one two \n\n three");
        assert!(PlainText::from_raw(" \n ").is_empty());
    }

    #[test]
    fn plain_text_drops_control_characters() {
        let text = PlainText::from_raw("nul\0 here\x01\x1b[0m\tand\r\nthere");
        assert_eq!(text.as_str(), "nul here[0m and\r\nthere");
        assert!(!text.as_str().contains('\0'));
    }
}
