//! crates/docqa_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// Storage-assigned identity of a user row.
pub type UserId = i64;
/// Storage-assigned identity of a document row.
pub type DocumentId = i64;

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

// Only used internally for login/registration - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// A text document uploaded by a user, stored as normalized plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub user_id: UserId,
    pub filename: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A document without its content, as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            uploaded_at: doc.uploaded_at,
        }
    }
}

/// A single question-and-answer exchange about one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    pub id: i64,
    pub document_id: DocumentId,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Request-scoped view of a browser login session.
///
/// Loaded once per request by the auth layer and threaded explicitly through the
/// workflows; the active-document pointer is written back through
/// [`crate::ports::SessionStore`] whenever it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: UserId,
    pub username: String,
    pub active_document_id: Option<DocumentId>,
}
