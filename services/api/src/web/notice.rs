//! services/api/src/web/notice.rs
//!
//! Human-readable notices returned with every response, and the conversion of
//! workflow errors into them at the request boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docqa_core::{PortError, QaError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A message meant to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Danger, message: message.into() }
    }
}

/// A failed request: a status code plus the notice explaining it.
#[derive(Debug)]
pub struct Rejection {
    pub status: StatusCode,
    pub notice: Notice,
}

impl Rejection {
    pub fn new(status: StatusCode, notice: Notice) -> Self {
        Self { status, notice }
    }

    pub fn login_required() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, Notice::warning("Please log in first."))
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Notice::danger("Something went wrong. Please try again."),
        )
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.notice)).into_response()
    }
}

impl From<QaError> for Rejection {
    fn from(err: QaError) -> Self {
        match err {
            QaError::UnsupportedFormat(_) => Self::new(
                StatusCode::BAD_REQUEST,
                Notice::danger("Invalid or no file selected. Only .txt, .pdf, .docx allowed."),
            ),
            QaError::Extraction(cause) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                Notice::danger(format!("Error reading file: {cause}")),
            ),
            QaError::NoDocument => Self::new(
                StatusCode::NOT_FOUND,
                Notice::danger("No document found. Please upload one first."),
            ),
            QaError::DocumentNotFound => {
                Self::new(StatusCode::NOT_FOUND, Notice::danger("Document not found."))
            }
            QaError::DuplicateUsername => {
                Self::new(StatusCode::CONFLICT, Notice::danger("Username already exists."))
            }
            QaError::Authentication => {
                Self::new(StatusCode::UNAUTHORIZED, Notice::danger("Invalid credentials."))
            }
            QaError::ExternalService(cause) => {
                error!("Answering model failed: {}", cause);
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    Notice::danger("The answering service is unavailable right now."),
                )
            }
            QaError::InvalidInput(message) => {
                Self::new(StatusCode::BAD_REQUEST, Notice::danger(message))
            }
            QaError::Port(PortError::Unauthorized) => Self::login_required(),
            QaError::Port(e) => {
                error!("Storage failure: {:?}", e);
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_statuses_and_notices() {
        let cases = [
            (QaError::UnsupportedFormat("x.zip".into()), StatusCode::BAD_REQUEST),
            (QaError::Extraction("bad xref".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (QaError::NoDocument, StatusCode::NOT_FOUND),
            (QaError::DuplicateUsername, StatusCode::CONFLICT),
            (QaError::Authentication, StatusCode::UNAUTHORIZED),
            (QaError::Port(PortError::Unexpected("db down".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let rejection = Rejection::from(err);
            assert_eq!(rejection.status, status);
            assert_eq!(rejection.notice.level, NoticeLevel::Danger);
        }
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let rejection = Rejection::from(QaError::Port(PortError::Unexpected("password=hunter2".into())));
        assert!(!rejection.notice.message.contains("hunter2"));
    }

    #[test]
    fn extraction_cause_is_shown() {
        let rejection = Rejection::from(QaError::Extraction("PDF has no pages".into()));
        assert_eq!(rejection.notice.message, "Error reading file: PDF has no pages");
    }
}
