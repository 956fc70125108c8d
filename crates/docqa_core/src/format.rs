//! crates/docqa_core/src/format.rs
//!
//! Upload format detection and filename sanitising. The client-declared filename is
//! the only input trusted to pick an extraction path; content-type metadata is ignored.

use std::fmt;

use crate::error::{QaError, QaResult};

/// The three upload formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Word,
}

impl DocumentFormat {
    /// Picks the format from the filename's last extension, case-insensitively.
    pub fn from_filename(filename: &str) -> QaResult<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .ok_or_else(|| QaError::UnsupportedFormat(filename.to_string()))
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Word),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Pdf => "pdf",
            Self::Word => "docx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Reduces a client filename to a safe ASCII display name that keeps `format`'s
/// extension.
///
/// Directory components are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9._-]` is removed and leading/trailing `.`/`_` are stripped. A name
/// that loses its stem or extension along the way becomes `upload.<ext>`.
pub fn sanitize_filename(filename: &str, format: DocumentFormat) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    match cleaned.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && DocumentFormat::from_extension(ext) == Some(format) =>
        {
            cleaned.to_string()
        }
        _ => format!("upload.{}", format.extension()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_allowed_extensions_case_insensitively() {
        assert_eq!(DocumentFormat::from_filename("notes.txt").unwrap(), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::from_filename("Paper.PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_filename("cv.v2.Docx").unwrap(), DocumentFormat::Word);
    }

    #[test]
    fn rejects_missing_or_unknown_extensions() {
        for name in ["README", "archive.zip", "legacy.doc", "trailing.", ""] {
            assert!(
                matches!(DocumentFormat::from_filename(name), Err(QaError::UnsupportedFormat(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn sanitizes_paths_and_odd_characters() {
        assert_eq!(
            sanitize_filename("../../etc/My Notes (final).txt", DocumentFormat::PlainText),
            "My_Notes_final.txt"
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\bob\\report.PDF", DocumentFormat::Pdf),
            "report.PDF"
        );
    }

    #[test]
    fn falls_back_when_nothing_usable_survives() {
        assert_eq!(sanitize_filename("файл.pdf", DocumentFormat::Pdf), "upload.pdf");
        assert_eq!(sanitize_filename(".docx", DocumentFormat::Word), "upload.docx");
    }
}
