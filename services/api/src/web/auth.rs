//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use docqa_core::{PortError, QaError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::notice::{Notice, Rejection};
use crate::web::state::AppState;

const SESSION_COOKIE: &str = "session";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub notice: Notice,
    pub user_id: i64,
    pub username: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Reads the auth session id from the request's `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .filter(|id| !id.is_empty())
}

fn session_cookie_header(session_id: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_secs
    )
}

fn validate_credentials(req: &CredentialsRequest) -> Result<&str, QaError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(QaError::InvalidInput(
            "Username and password are required.".to_string(),
        ));
    }
    Ok(username)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Missing username or password", body = Notice),
        (status = 409, description = "Username already exists", body = Notice)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let username = validate_credentials(&req)?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            Rejection::internal()
        })?
        .to_string();

    // 2. Create user in database; the unique constraint decides duplicates
    let user = state
        .db
        .create_user(username, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => QaError::DuplicateUsername,
            e => QaError::Port(e),
        })?;
    info!(user_id = user.id, "User registered.");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            notice: Notice::success("Registration successful. Please log in."),
            user_id: user.id,
            username: user.username,
        }),
    ))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful; sets the session cookie", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = Notice)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let username = validate_credentials(&req)?;

    // 1. Get user by username
    let creds = state
        .db
        .get_user_credentials(username)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => QaError::Authentication,
            e => QaError::Port(e),
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&creds.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        Rejection::internal()
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(QaError::Authentication.into());
    }

    // 3. Create the auth session
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    state
        .db
        .create_auth_session(&auth_session_id, creds.user_id, Utc::now() + ttl)
        .await
        .map_err(QaError::from)?;
    info!(user_id = creds.user_id, "User logged in.");

    // 4. Return response with cookie
    let cookie = session_cookie_header(&auth_session_id, ttl.num_seconds());
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            notice: Notice::success("Login successful."),
            user_id: creds.user_id,
            username: creds.username,
        }),
    ))
}

/// POST /auth/logout - Logout and invalidate the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful; clears the session cookie", body = Notice)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Rejection> {
    if let Some(auth_session_id) = session_cookie(&headers) {
        state
            .db
            .delete_auth_session(auth_session_id)
            .await
            .map_err(QaError::from)?;
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie_header("", 0))],
        Json(Notice::info("Logged out successfully.")),
    ))
}
