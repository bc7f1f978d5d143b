use crate::{
    AppState,
    auth::RequestCredentials,
    bootstrap::{BootstrapController, CycleOutcome, PageRequest, ServerOutcome},
    guard::RedirectIntent,
    models::SessionResponse,
    session::SessionContext,
};
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::collections::BTreeMap;

// --- Filter Structs ---

/// SessionQuery
///
/// The page the client is currently on, so a stale session can be told whether
/// to leave it.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SessionQuery {
    /// Path the client is on, defaults to `/`.
    pub path: Option<String>,
}

// --- Redirect Adapter ---

/// redirect_response
///
/// Turns a redirect intent into the HTTP form: `302 Found` with a `Location`
/// header and an empty body.
pub fn redirect_response(intent: &RedirectIntent) -> Response {
    tracing::debug!(id = %intent.id, target = %intent.target, "redirecting request");
    (StatusCode::FOUND, [(header::LOCATION, intent.target.clone())]).into_response()
}

// --- Handlers ---

/// render_page
///
/// [Page Route] Server-side evaluation of a page request. The guard runs first;
/// a denied request gets its 302 before any initial props are resolved.
pub async fn render_page(
    State(state): State<AppState>,
    credentials: RequestCredentials,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let request = PageRequest {
        path: uri.path().to_string(),
        query,
    };

    match state
        .shell
        .evaluate_request(&request, credentials.store.has())
        .await
    {
        Ok(ServerOutcome::Redirect(intent)) => redirect_response(&intent),
        Ok(ServerOutcome::Render(envelope)) => Json(envelope).into_response(),
        Ok(ServerOutcome::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => e.into_response(),
    }
}

/// get_session
///
/// [API Route] Runs one bootstrap cycle for the presented credential and returns
/// the settled session. A stale credential is cleared (its cookie removed) and
/// the client is told to go to the login page.
#[utoipa::path(
    get,
    path = "/api/session",
    params(SessionQuery),
    responses((status = 200, description = "Settled session", body = SessionResponse))
)]
pub async fn get_session(
    State(state): State<AppState>,
    credentials: RequestCredentials,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    let session = SessionContext::new();
    let controller = BootstrapController::new(
        credentials.store.clone(),
        state.fetcher.clone(),
        state.shell.guard().clone(),
        state.shell.pages().clone(),
        session.clone(),
        state.config.auth_required_code.clone(),
    );
    controller.set_current_path(&path);

    let redirect_to = match controller.run_cycle().await {
        CycleOutcome::StaleCredential { redirect } => redirect.map(|intent| intent.target),
        // Without a credential the guard still decides for the current page.
        CycleOutcome::NoCredential => state
            .shell
            .guard()
            .check(state.shell.pages().route_for(&path), false)
            .map(|intent| intent.target),
        _ => None,
    };

    let body = SessionResponse {
        session: session.snapshot(),
        redirect_to,
    };
    (credentials.jar(), Json(body))
}

/// logout
///
/// [API Route] Explicit logout: clears the credential cookie.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(credentials: RequestCredentials) -> impl IntoResponse {
    credentials.store.clear();
    (credentials.jar(), StatusCode::NO_CONTENT)
}
