//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the storage ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docqa_core::domain::{
    Document, DocumentId, DocumentSummary, QaEntry, SessionContext, User, UserCredentials, UserId,
};
use docqa_core::ports::{
    DocumentStore, PortError, PortResult, QaHistoryStore, SessionStore, UserStore,
};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every storage port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    password_hash: String,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: i64,
    user_id: i64,
    filename: String,
    content: String,
    uploaded_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            user_id: self.user_id,
            filename: self.filename,
            content: self.content,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(FromRow)]
struct DocumentSummaryRecord {
    id: i64,
    filename: String,
    uploaded_at: DateTime<Utc>,
}
impl DocumentSummaryRecord {
    fn to_domain(self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            filename: self.filename,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(FromRow)]
struct QaRecord {
    id: i64,
    document_id: i64,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
}
impl QaRecord {
    fn to_domain(self) -> QaEntry {
        QaEntry {
            id: self.id,
            document_id: self.document_id,
            question: self.question,
            answer: self.answer,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    session_id: String,
    user_id: i64,
    username: String,
    active_document_id: Option<i64>,
}
impl SessionRecord {
    fn to_domain(self) -> SessionContext {
        SessionContext {
            session_id: self.session_id,
            user_id: self.user_id,
            username: self.username,
            active_document_id: self.active_document_id,
        }
    }
}

const DOCUMENT_COLUMNS: &str = "id, user_id, filename, content, uploaded_at";

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("username {username}"))
            }
            e => unexpected(e),
        })?;

        Ok(User {
            id: record.id,
            username: record.username,
        })
    }

    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(UserRecord::to_credentials)
        .ok_or_else(|| PortError::NotFound(format!("User {username} not found")))
    }
}

#[async_trait]
impl SessionStore for DbAdapter {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn load_session_context(&self, session_id: &str) -> PortResult<SessionContext> {
        sqlx::query_as::<_, SessionRecord>(
            "SELECT s.id AS session_id, s.user_id, u.username, s.active_document_id \
             FROM auth_sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(SessionRecord::to_domain)
        .ok_or(PortError::Unauthorized)
    }

    async fn set_active_document(
        &self,
        session_id: &str,
        document_id: DocumentId,
    ) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE auth_sessions SET active_document_id = $1 WHERE id = $2")
                .bind(document_id)
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Session {session_id} not found")));
        }
        Ok(())
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn save_document(
        &self,
        owner: UserId,
        filename: &str,
        content: &str,
    ) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "INSERT INTO documents (user_id, filename, content) VALUES ($1, $2, $3) \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(owner)
        .bind(filename)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_by_owner_and_filename(
        &self,
        owner: UserId,
        filename: &str,
    ) -> PortResult<Option<Document>> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = $1 AND filename = $2 \
             ORDER BY uploaded_at DESC, id DESC LIMIT 1"
        ))
        .bind(owner)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(DocumentRecord::to_domain))
    }

    async fn get_most_recent_by_owner(&self, owner: UserId) -> PortResult<Option<Document>> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = $1 \
             ORDER BY uploaded_at DESC, id DESC LIMIT 1"
        ))
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(DocumentRecord::to_domain))
    }

    async fn get_by_id_for_owner(
        &self,
        document_id: DocumentId,
        owner: UserId,
    ) -> PortResult<Option<Document>> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND user_id = $2"
        ))
        .bind(document_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(DocumentRecord::to_domain))
    }

    async fn list_by_owner(&self, owner: UserId) -> PortResult<Vec<DocumentSummary>> {
        let records = sqlx::query_as::<_, DocumentSummaryRecord>(
            "SELECT id, filename, uploaded_at FROM documents WHERE user_id = $1 \
             ORDER BY uploaded_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

#[async_trait]
impl QaHistoryStore for DbAdapter {
    async fn append_qa(
        &self,
        document_id: DocumentId,
        question: &str,
        answer: &str,
    ) -> PortResult<QaEntry> {
        let record = sqlx::query_as::<_, QaRecord>(
            "INSERT INTO qa_history (document_id, question, answer) VALUES ($1, $2, $3) \
             RETURNING id, document_id, question, answer, created_at",
        )
        .bind(document_id)
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_by_document(&self, document_id: DocumentId) -> PortResult<Vec<QaEntry>> {
        let records = sqlx::query_as::<_, QaRecord>(
            "SELECT id, document_id, question, answer, created_at FROM qa_history \
             WHERE document_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let entries = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(entries)
    }
}
