//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use docqa_core::ports::{DatabaseService, QuestionAnsweringService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Per-user state lives in the request-scoped `SessionContext` that the auth
/// middleware inserts, never here.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub qa_adapter: Arc<dyn QuestionAnsweringService>,
}
