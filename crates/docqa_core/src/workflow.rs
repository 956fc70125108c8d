//! crates/docqa_core/src/workflow.rs
//!
//! The request-level use cases: ingesting an upload, opening a document and
//! answering a question. Each runs to completion against the ports it is given and
//! keeps the session's active-document pointer current.

use tracing::{info, warn};

use crate::domain::{Document, DocumentId, DocumentSummary, QaEntry, SessionContext};
use crate::error::{QaError, QaResult};
use crate::extract::extract;
use crate::format::{sanitize_filename, DocumentFormat};
use crate::ports::{DocumentStore, QaHistoryStore, QuestionAnsweringService, SessionStore};
use crate::prompt::build_prompt;
use crate::resolve::{remember_active, resolve_document};

/// Persisted in place of an answer when the model fails or returns nothing.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't process that.";

/// A document together with its Q&A history, newest first.
#[derive(Debug, Clone)]
pub struct DocumentView {
    pub document: Document,
    pub history: Vec<QaEntry>,
}

/// The result of answering one question.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    pub document: Document,
    pub answer: String,
    /// `false` when [`FALLBACK_ANSWER`] was used.
    pub answered_by_model: bool,
    pub history: Vec<QaEntry>,
}

/// Validates, extracts, normalizes and stores an uploaded file, then makes it the
/// session's active document.
///
/// The format is checked before any bytes are parsed, and nothing is stored unless
/// extraction succeeds.
pub async fn ingest_upload<S>(
    store: &S,
    ctx: &mut SessionContext,
    filename: &str,
    bytes: Vec<u8>,
) -> QaResult<Document>
where
    S: DocumentStore + SessionStore + ?Sized,
{
    let format = DocumentFormat::from_filename(filename)?;
    let stored_name = sanitize_filename(filename, format);

    let text = tokio::task::spawn_blocking(move || extract(&bytes, format))
        .await
        .map_err(|e| QaError::Extraction(format!("extraction task failed: {e}")))??;

    let document = store
        .save_document(ctx.user_id, &stored_name, text.as_str())
        .await?;
    info!(
        user_id = ctx.user_id,
        document_id = document.id,
        %format,
        chars = document.content.len(),
        "Document uploaded."
    );

    remember_active(store, ctx, document.id).await?;
    Ok(document)
}

/// Opens the caller's most recent document named `filename` and makes it active.
pub async fn open_document<S>(
    store: &S,
    ctx: &mut SessionContext,
    filename: &str,
) -> QaResult<DocumentView>
where
    S: DocumentStore + SessionStore + QaHistoryStore + ?Sized,
{
    let document = store
        .get_by_owner_and_filename(ctx.user_id, filename)
        .await?
        .ok_or(QaError::DocumentNotFound)?;
    remember_active(store, ctx, document.id).await?;

    let history = store.list_by_document(document.id).await?;
    Ok(DocumentView { document, history })
}

/// The caller's documents, newest first.
pub async fn dashboard<S>(store: &S, ctx: &SessionContext) -> QaResult<Vec<DocumentSummary>>
where
    S: DocumentStore + ?Sized,
{
    Ok(store.list_by_owner(ctx.user_id).await?)
}

/// Answers `question` about the resolved document and records the exchange.
///
/// Model failures and empty answers degrade to [`FALLBACK_ANSWER`]; they are never
/// returned as errors.
pub async fn ask_question<S, M>(
    store: &S,
    model: &M,
    ctx: &mut SessionContext,
    question: &str,
    document_id: Option<DocumentId>,
) -> QaResult<AskOutcome>
where
    S: DocumentStore + SessionStore + QaHistoryStore + ?Sized,
    M: QuestionAnsweringService + ?Sized,
{
    let question = question.trim();
    if question.is_empty() {
        return Err(QaError::InvalidInput("Please enter a question.".to_string()));
    }

    let document = resolve_document(store, ctx, document_id).await?;
    let prompt = build_prompt(&document.content, question);

    let (answer, answered_by_model) = match model.answer(&prompt).await {
        Ok(text) if !text.trim().is_empty() => (text, true),
        Ok(_) => {
            let err = QaError::ExternalService("empty answer".to_string());
            warn!(document_id = document.id, error = %err, "Using fallback answer.");
            (FALLBACK_ANSWER.to_string(), false)
        }
        Err(e) => {
            let err = QaError::ExternalService(e.to_string());
            warn!(document_id = document.id, error = %err, "Using fallback answer.");
            (FALLBACK_ANSWER.to_string(), false)
        }
    };

    store.append_qa(document.id, question, &answer).await?;
    info!(
        user_id = ctx.user_id,
        document_id = document.id,
        answered_by_model,
        "Question answered."
    );

    let history = store.list_by_document(document.id).await?;
    Ok(AskOutcome {
        document,
        answer,
        answered_by_model,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDatabase;
    use crate::ports::{PortError, PortResult, UserStore};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    /// Replies with a fixed result and records every prompt it receives.
    struct ScriptedModel {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self { reply: Ok(text.to_string()), prompts: Mutex::default() }
        }

        fn failing(message: &str) -> Self {
            Self { reply: Err(message.to_string()), prompts: Mutex::default() }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuestionAnsweringService for ScriptedModel {
        async fn answer(&self, prompt: &str) -> PortResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(PortError::Unexpected)
        }
    }

    async fn session(db: &InMemoryDatabase, username: &str) -> SessionContext {
        let user = db.create_user(username, "hash").await.unwrap();
        let sid = format!("sid-{username}");
        db.create_auth_session(&sid, user.id, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        db.load_session_context(&sid).await.unwrap()
    }

    #[tokio::test]
    async fn upload_stores_normalized_text_and_activates_it() {
        let db = InMemoryDatabase::new();
        let mut ctx = session(&db, "alice").await;

        let doc = ingest_upload(&db, &mut ctx, "notes.txt", b"Hello   world.\n\n\n\nBye.".to_vec())
            .await
            .unwrap();

        assert_eq!(doc.content, "Hello world.\n\nBye.");
        assert_eq!(doc.filename, "notes.txt");
        assert_eq!(ctx.active_document_id, Some(doc.id));
    }

    #[tokio::test]
    async fn unsupported_upload_stores_nothing() {
        let db = InMemoryDatabase::new();
        let mut ctx = session(&db, "alice").await;

        let err = ingest_upload(&db, &mut ctx, "slides.pptx", b"whatever".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, QaError::UnsupportedFormat(_)));
        assert_eq!(db.document_count().await, 0);
        assert_eq!(ctx.active_document_id, None);
    }

    #[tokio::test]
    async fn failed_extraction_stores_nothing() {
        let db = InMemoryDatabase::new();
        let mut ctx = session(&db, "alice").await;

        let err = ingest_upload(&db, &mut ctx, "broken.pdf", b"not a pdf".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, QaError::Extraction(_)));
        assert_eq!(db.document_count().await, 0);
    }

    #[tokio::test]
    async fn asking_without_documents_is_no_document_and_records_nothing() {
        let db = InMemoryDatabase::new();
        let model = ScriptedModel::replying("unused");
        let mut ctx = session(&db, "alice").await;

        let err = ask_question(&db, &model, &mut ctx, "Anything?", None).await.unwrap_err();

        assert!(matches!(err, QaError::NoDocument));
        assert_eq!(db.qa_count().await, 0);
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_the_model() {
        let db = InMemoryDatabase::new();
        let model = ScriptedModel::replying("unused");
        let mut ctx = session(&db, "alice").await;
        ingest_upload(&db, &mut ctx, "a.txt", b"text".to_vec()).await.unwrap();

        let err = ask_question(&db, &model, &mut ctx, "   ", None).await.unwrap_err();
        assert!(matches!(err, QaError::InvalidInput(_)));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn answers_are_recorded_newest_first() {
        let db = InMemoryDatabase::new();
        let model = ScriptedModel::replying("From the document: green.");
        let mut ctx = session(&db, "alice").await;
        let doc = ingest_upload(&db, &mut ctx, "sky.txt", b"The sky is green.".to_vec())
            .await
            .unwrap();

        let first = ask_question(&db, &model, &mut ctx, " What colour? ", None).await.unwrap();
        assert_eq!(first.document.id, doc.id);
        assert_eq!(first.answer, "From the document: green.");
        assert!(first.answered_by_model);
        assert_eq!(first.history.len(), 1);
        assert_eq!(first.history[0].question, "What colour?");

        let second = ask_question(&db, &model, &mut ctx, "Why?", None).await.unwrap();
        let questions: Vec<&str> = second.history.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, ["Why?", "What colour?"]);

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("The sky is green."));
        assert!(prompt.contains("What colour?"));
    }

    #[tokio::test]
    async fn model_failure_degrades_to_fallback_answer() {
        let db = InMemoryDatabase::new();
        let model = ScriptedModel::failing("upstream 503");
        let mut ctx = session(&db, "alice").await;
        ingest_upload(&db, &mut ctx, "a.txt", b"text".to_vec()).await.unwrap();

        let outcome = ask_question(&db, &model, &mut ctx, "Q?", None).await.unwrap();
        assert_eq!(outcome.answer, FALLBACK_ANSWER);
        assert!(!outcome.answered_by_model);
        assert_eq!(outcome.history[0].answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn empty_model_answer_degrades_to_fallback_answer() {
        let db = InMemoryDatabase::new();
        let model = ScriptedModel::replying("  \n");
        let mut ctx = session(&db, "alice").await;
        ingest_upload(&db, &mut ctx, "a.txt", b"text".to_vec()).await.unwrap();

        let outcome = ask_question(&db, &model, &mut ctx, "Q?", None).await.unwrap();
        assert_eq!(outcome.answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn opening_a_document_makes_it_the_question_target() {
        let db = InMemoryDatabase::new();
        let model = ScriptedModel::replying("ok");
        let mut ctx = session(&db, "alice").await;
        let first = ingest_upload(&db, &mut ctx, "first.txt", b"one".to_vec()).await.unwrap();
        ingest_upload(&db, &mut ctx, "second.txt", b"two".to_vec()).await.unwrap();

        let view = open_document(&db, &mut ctx, "first.txt").await.unwrap();
        assert_eq!(view.document.id, first.id);
        assert!(view.history.is_empty());

        let outcome = ask_question(&db, &model, &mut ctx, "Q?", None).await.unwrap();
        assert_eq!(outcome.document.id, first.id);
    }

    #[tokio::test]
    async fn users_never_see_each_others_documents() {
        let db = InMemoryDatabase::new();
        let mut alice = session(&db, "alice").await;
        let mut bob = session(&db, "bob").await;
        ingest_upload(&db, &mut alice, "notes.txt", b"alice".to_vec()).await.unwrap();
        ingest_upload(&db, &mut bob, "notes.txt", b"bob".to_vec()).await.unwrap();

        let alice_view = open_document(&db, &mut alice, "notes.txt").await.unwrap();
        let bob_view = open_document(&db, &mut bob, "notes.txt").await.unwrap();
        assert_eq!(alice_view.document.content, "alice");
        assert_eq!(bob_view.document.content, "bob");

        assert_eq!(dashboard(&db, &alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn opening_an_unknown_filename_is_not_found() {
        let db = InMemoryDatabase::new();
        let mut ctx = session(&db, "alice").await;
        let err = open_document(&db, &mut ctx, "missing.txt").await.unwrap_err();
        assert!(matches!(err, QaError::DocumentNotFound));
    }
}
