use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// `/health` plus the page fallback. Every path not claimed by another route is a
/// page request: the handler runs the navigation guard and either redirects to
/// the login page or returns the resolved page envelope.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe.
        .route("/health", get(|| async { "ok" }))
        // GET /*
        // Guarded page shell (302 to the login path when denied).
        .fallback(handlers::render_page)
}
