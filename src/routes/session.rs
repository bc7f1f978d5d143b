use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Session Router Module
///
/// Mounted under `/api`.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // GET /api/session?path=...
        // Server-side bootstrap cycle for the presented credential.
        .route("/session", get(handlers::get_session))
        // POST /api/logout
        // Clears the credential cookie.
        .route("/logout", post(handlers::logout))
}
