//! crates/docqa_core/src/memory.rs
//!
//! An in-process implementation of every storage port. Ids autoincrement from 1,
//! timestamps are taken on insert and recency ties are broken by id, matching the
//! PostgreSQL adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    Document, DocumentId, DocumentSummary, QaEntry, SessionContext, User, UserCredentials, UserId,
};
use crate::ports::{
    DocumentStore, PortError, PortResult, QaHistoryStore, SessionStore, UserStore,
};

#[derive(Debug, Clone)]
struct AuthSessionRow {
    user_id: UserId,
    active_document_id: Option<DocumentId>,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, AuthSessionRow>,
    documents: Vec<Document>,
    qa_history: Vec<QaEntry>,
}

/// Storage held entirely in memory behind a single async mutex.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all users.
    pub async fn document_count(&self) -> usize {
        self.tables.lock().await.documents.len()
    }

    /// Number of stored Q&A entries across all documents.
    pub async fn qa_count(&self) -> usize {
        self.tables.lock().await.qa_history.len()
    }
}

fn newest_first<T>(items: &mut [&T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(*b).cmp(&key(*a)));
}

#[async_trait]
impl UserStore for InMemoryDatabase {
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(PortError::Conflict(format!("username {username}")));
        }
        let user_id = tables.users.len() as UserId + 1;
        tables.users.push(UserCredentials {
            user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        });
        Ok(User {
            id: user_id,
            username: username.to_string(),
        })
    }

    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.lock().await;
        tables
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {username} not found")))
    }
}

#[async_trait]
impl SessionStore for InMemoryDatabase {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.lock().await;
        tables.sessions.insert(
            session_id.to_string(),
            AuthSessionRow {
                user_id,
                active_document_id: None,
                expires_at,
            },
        );
        Ok(())
    }

    async fn load_session_context(&self, session_id: &str) -> PortResult<SessionContext> {
        let tables = self.tables.lock().await;
        let row = tables
            .sessions
            .get(session_id)
            .filter(|row| row.expires_at > Utc::now())
            .ok_or(PortError::Unauthorized)?;
        let user = tables
            .users
            .iter()
            .find(|u| u.user_id == row.user_id)
            .ok_or(PortError::Unauthorized)?;
        Ok(SessionContext {
            session_id: session_id.to_string(),
            user_id: row.user_id,
            username: user.username.clone(),
            active_document_id: row.active_document_id,
        })
    }

    async fn set_active_document(
        &self,
        session_id: &str,
        document_id: DocumentId,
    ) -> PortResult<()> {
        let mut tables = self.tables.lock().await;
        let row = tables
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {session_id} not found")))?;
        row.active_document_id = Some(document_id);
        Ok(())
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().await.sessions.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDatabase {
    async fn save_document(
        &self,
        owner: UserId,
        filename: &str,
        content: &str,
    ) -> PortResult<Document> {
        let mut tables = self.tables.lock().await;
        let doc = Document {
            id: tables.documents.len() as DocumentId + 1,
            user_id: owner,
            filename: filename.to_string(),
            content: content.to_string(),
            uploaded_at: Utc::now(),
        };
        tables.documents.push(doc.clone());
        Ok(doc)
    }

    async fn get_by_owner_and_filename(
        &self,
        owner: UserId,
        filename: &str,
    ) -> PortResult<Option<Document>> {
        let tables = self.tables.lock().await;
        let mut matches: Vec<&Document> = tables
            .documents
            .iter()
            .filter(|d| d.user_id == owner && d.filename == filename)
            .collect();
        newest_first(&mut matches, |d| (d.uploaded_at, d.id));
        Ok(matches.first().map(|d| (*d).clone()))
    }

    async fn get_most_recent_by_owner(&self, owner: UserId) -> PortResult<Option<Document>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<&Document> = tables.documents.iter().filter(|d| d.user_id == owner).collect();
        newest_first(&mut owned, |d| (d.uploaded_at, d.id));
        Ok(owned.first().map(|d| (*d).clone()))
    }

    async fn get_by_id_for_owner(
        &self,
        document_id: DocumentId,
        owner: UserId,
    ) -> PortResult<Option<Document>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .documents
            .iter()
            .find(|d| d.id == document_id && d.user_id == owner)
            .cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> PortResult<Vec<DocumentSummary>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<&Document> = tables.documents.iter().filter(|d| d.user_id == owner).collect();
        newest_first(&mut owned, |d| (d.uploaded_at, d.id));
        Ok(owned.into_iter().map(DocumentSummary::from).collect())
    }
}

#[async_trait]
impl QaHistoryStore for InMemoryDatabase {
    async fn append_qa(
        &self,
        document_id: DocumentId,
        question: &str,
        answer: &str,
    ) -> PortResult<QaEntry> {
        let mut tables = self.tables.lock().await;
        if !tables.documents.iter().any(|d| d.id == document_id) {
            return Err(PortError::NotFound(format!("Document {document_id} not found")));
        }
        let entry = QaEntry {
            id: tables.qa_history.len() as i64 + 1,
            document_id,
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };
        tables.qa_history.push(entry.clone());
        Ok(entry)
    }

    async fn list_by_document(&self, document_id: DocumentId) -> PortResult<Vec<QaEntry>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<&QaEntry> = tables
            .qa_history
            .iter()
            .filter(|e| e.document_id == document_id)
            .collect();
        newest_first(&mut entries, |e| (e.created_at, e.id));
        Ok(entries.into_iter().cloned().collect())
    }
}
