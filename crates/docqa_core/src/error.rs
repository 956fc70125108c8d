//! crates/docqa_core/src/error.rs
//!
//! The error taxonomy of the document Q&A workflows. Every variant is recoverable
//! at the request boundary.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    /// The filename has no extension or one outside `{txt, pdf, docx}`.
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    /// A supported file could not be parsed.
    #[error("failed to extract text: {0}")]
    Extraction(String),

    /// The user has no document a question could be directed at.
    #[error("no document available for this user")]
    NoDocument,

    /// An explicitly requested document does not exist for this user.
    #[error("document not found")]
    DocumentNotFound,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("invalid credentials")]
    Authentication,

    #[error("answering model failed: {0}")]
    ExternalService(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

pub type QaResult<T> = Result<T, QaError>;
