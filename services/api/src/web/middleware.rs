//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use docqa_core::PortError;
use std::sync::Arc;
use tracing::error;

use crate::web::auth::session_cookie;
use crate::web::notice::Rejection;
use crate::web::state::AppState;

/// Middleware that validates the auth session cookie and loads the request's
/// `SessionContext`.
///
/// If valid, inserts the context into request extensions for handlers to use.
/// If invalid, expired or missing, answers with a "please log in" notice.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Rejection> {
    // 1. Parse session ID from cookie
    let auth_session_id = session_cookie(req.headers())
        .ok_or_else(Rejection::login_required)?
        .to_string();

    // 2. Load the session context from the database
    let ctx = state
        .db
        .load_session_context(&auth_session_id)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized | PortError::NotFound(_) => Rejection::login_required(),
            e => {
                error!("Failed to load auth session: {:?}", e);
                Rejection::internal()
            }
        })?;

    // 3. Insert the context into request extensions and continue to the handler
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
