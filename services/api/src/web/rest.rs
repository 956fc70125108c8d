//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the document and question endpoints and the
//! master definition for the OpenAPI specification.

use crate::web::{
    auth,
    notice::{Notice, NoticeLevel, Rejection},
    state::AppState,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use docqa_core::{workflow, DocumentSummary, QaEntry, QaError, SessionContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        dashboard_handler,
        upload_handler,
        document_view_handler,
        ask_handler,
    ),
    components(
        schemas(
            Notice,
            NoticeLevel,
            auth::CredentialsRequest,
            auth::AuthResponse,
            DocumentItem,
            QaItem,
            DashboardResponse,
            UploadResponse,
            DocumentViewResponse,
            AskRequest,
            AskResponse,
        )
    ),
    tags(
        (name = "Document Q&A API", description = "Upload documents and ask questions about them.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct DocumentItem {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<DocumentSummary> for DocumentItem {
    fn from(doc: DocumentSummary) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QaItem {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

impl From<QaEntry> for QaItem {
    fn from(entry: QaEntry) -> Self {
        Self {
            question: entry.question,
            answer: entry.answer,
            timestamp: entry.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub username: String,
    /// Newest first.
    pub documents: Vec<DocumentItem>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub notice: Notice,
    pub document: DocumentItem,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentViewResponse {
    pub username: String,
    pub document: DocumentItem,
    /// Newest first.
    pub history: Vec<QaItem>,
}

#[derive(Deserialize, ToSchema)]
pub struct AskRequest {
    pub question: String,
    /// Targets this document instead of the session's active one.
    #[serde(default)]
    pub document_id: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct AskResponse {
    pub notice: Option<Notice>,
    pub username: String,
    pub document: DocumentItem,
    pub answer: String,
    /// Newest first.
    pub history: Vec<QaItem>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the signed-in user's documents.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "The user's documents, newest first", body = DashboardResponse),
        (status = 401, description = "Not logged in", body = Notice)
    )
)]
pub async fn dashboard_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<impl IntoResponse, Rejection> {
    let documents = workflow::dashboard(app_state.db.as_ref(), &ctx).await?;
    Ok(Json(DashboardResponse {
        username: ctx.username,
        documents: documents.into_iter().map(DocumentItem::from).collect(),
    }))
}

/// Upload a document.
///
/// Accepts a multipart/form-data request whose `document` part carries the file.
/// Only `.txt`, `.pdf` and `.docx` files are accepted; the uploaded document
/// becomes the target of subsequent questions.
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content_type = "multipart/form-data", description = "The document to upload, in a part named `document`."),
    responses(
        (status = 201, description = "Document stored", body = UploadResponse),
        (status = 400, description = "Missing file or unsupported extension", body = Notice),
        (status = 413, description = "The upload exceeds the size limit", body = Notice),
        (status = 422, description = "The file could not be read", body = Notice)
    )
)]
pub async fn upload_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(mut ctx): Extension<SessionContext>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Rejection> {
    let limit = app_state.config.max_upload_bytes;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_rejection(e, limit, "Failed to read upload"))?
    {
        if field.name() != Some("document") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_rejection(e, limit, "Failed to read file bytes"))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| QaError::UnsupportedFormat(String::new()))?;

    let document =
        workflow::ingest_upload(app_state.db.as_ref(), &mut ctx, &file_name, data.to_vec()).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            notice: Notice::success("File uploaded successfully."),
            document: DocumentSummary::from(&document).into(),
        }),
    ))
}

/// Body-limit overruns become 413; any other malformed multipart body is a 400.
fn multipart_rejection(err: MultipartError, limit: usize, context: &str) -> Rejection {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(limit, "Upload rejected: {}", err);
        return Rejection::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            Notice::danger(format!("File too large. Uploads are limited to {limit} bytes.")),
        );
    }
    Rejection::new(
        StatusCode::BAD_REQUEST,
        Notice::danger(format!("{context}: {err}")),
    )
}

/// Open one of the user's documents with its Q&A history.
///
/// The opened document becomes the target of subsequent questions.
#[utoipa::path(
    get,
    path = "/documents/{filename}",
    params(
        ("filename" = String, Path, description = "The stored filename of the document.")
    ),
    responses(
        (status = 200, description = "The document and its Q&A history, newest first", body = DocumentViewResponse),
        (status = 404, description = "No such document for this user", body = Notice)
    )
)]
pub async fn document_view_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(mut ctx): Extension<SessionContext>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, Rejection> {
    let view = workflow::open_document(app_state.db.as_ref(), &mut ctx, &filename).await?;
    Ok(Json(DocumentViewResponse {
        username: ctx.username,
        document: DocumentSummary::from(&view.document).into(),
        history: view.history.into_iter().map(QaItem::from).collect(),
    }))
}

/// Ask a question about the active (or an explicitly chosen) document.
#[utoipa::path(
    post,
    path = "/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "The answer and the document's updated history", body = AskResponse),
        (status = 400, description = "Empty question", body = Notice),
        (status = 404, description = "No document to ask about", body = Notice)
    )
)]
pub async fn ask_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(mut ctx): Extension<SessionContext>,
    Json(req): Json<AskRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let outcome = workflow::ask_question(
        app_state.db.as_ref(),
        app_state.qa_adapter.as_ref(),
        &mut ctx,
        &req.question,
        req.document_id,
    )
    .await?;

    let notice = if outcome.answered_by_model {
        None
    } else {
        warn!(document_id = outcome.document.id, "Returned fallback answer.");
        Some(Notice::warning("The answering service did not respond; a fallback answer was recorded."))
    };

    Ok(Json(AskResponse {
        notice,
        username: ctx.username,
        document: DocumentSummary::from(&outcome.document).into(),
        answer: outcome.answer,
        history: outcome.history.into_iter().map(QaItem::from).collect(),
    }))
}
