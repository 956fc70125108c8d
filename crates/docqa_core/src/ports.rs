//! crates/docqa_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Document, DocumentId, DocumentSummary, QaEntry, SessionContext, User, UserCredentials, UserId,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflicting item already exists: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The remote service refused the request itself; sending it again gives the same answer.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `PortError::Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User>;

    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Loads a non-expired session. Missing or expired sessions are `PortError::Unauthorized`.
    async fn load_session_context(&self, session_id: &str) -> PortResult<SessionContext>;

    async fn set_active_document(&self, session_id: &str, document_id: DocumentId)
        -> PortResult<()>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// Append-only storage of extracted documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save_document(
        &self,
        owner: UserId,
        filename: &str,
        content: &str,
    ) -> PortResult<Document>;

    /// Most recently uploaded document with this filename owned by `owner`.
    async fn get_by_owner_and_filename(
        &self,
        owner: UserId,
        filename: &str,
    ) -> PortResult<Option<Document>>;

    async fn get_most_recent_by_owner(&self, owner: UserId) -> PortResult<Option<Document>>;

    /// The document with this id, only if `owner` owns it.
    async fn get_by_id_for_owner(
        &self,
        document_id: DocumentId,
        owner: UserId,
    ) -> PortResult<Option<Document>>;

    /// Newest first.
    async fn list_by_owner(&self, owner: UserId) -> PortResult<Vec<DocumentSummary>>;
}

#[async_trait]
pub trait QaHistoryStore: Send + Sync {
    async fn append_qa(
        &self,
        document_id: DocumentId,
        question: &str,
        answer: &str,
    ) -> PortResult<QaEntry>;

    /// Newest first.
    async fn list_by_document(&self, document_id: DocumentId) -> PortResult<Vec<QaEntry>>;
}

/// Everything the web layer needs from durable storage.
pub trait DatabaseService: UserStore + SessionStore + DocumentStore + QaHistoryStore {}

impl<T> DatabaseService for T where T: UserStore + SessionStore + DocumentStore + QaHistoryStore {}

//=========================================================================================
// External Model Port
//=========================================================================================

#[async_trait]
pub trait QuestionAnsweringService: Send + Sync {
    /// Sends a fully built prompt to the answering model and returns its raw text.
    async fn answer(&self, prompt: &str) -> PortResult<String>;
}
