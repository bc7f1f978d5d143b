use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use portfolio_shell::{
    AppConfig, AppState, FetcherState, HttpSessionFetcher, create_router,
    credential::Credential,
    error::FetchError,
    fetcher::SessionFetcher,
    models::SessionResponse,
    session::SessionStatus,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    address
}

/// Stand-in for the auth API: the bearer token picks the answer.
async fn stub_me(headers: HeaderMap) -> impl IntoResponse {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();

    match token {
        "good" => (
            StatusCode::OK,
            Json(json!({ "id": 42, "email": "ada@example.com" })),
        )
            .into_response(),
        "expired" => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "TOKEN_EXPIRED" })),
        )
            .into_response(),
        "pending" => (
            StatusCode::FORBIDDEN,
            Json(json!({ "code": "AUTHORIZATION_REQUIRED" })),
        )
            .into_response(),
        "garbled" => (StatusCode::OK, "not json").into_response(),
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn spawn_auth_api() -> String {
    let address = serve(Router::new().route("/api/me", get(stub_me))).await;
    format!("{address}/api")
}

async fn spawn_app() -> TestApp {
    let auth_api_url = spawn_auth_api().await;
    let config = AppConfig {
        auth_api_url: auth_api_url.clone(),
        ..AppConfig::default()
    };
    let fetcher = Arc::new(HttpSessionFetcher::new(&auth_api_url)) as FetcherState;
    let address = serve(create_router(AppState::new(config, fetcher))).await;
    TestApp { address }
}

fn credential(raw: &str) -> Credential {
    Credential::new(raw).unwrap()
}

// --- HttpSessionFetcher ---

#[tokio::test]
async fn test_fetcher_returns_profile() {
    let fetcher = HttpSessionFetcher::new(&spawn_auth_api().await);
    let user = fetcher.fetch_current_user(&credential("good")).await.unwrap();
    assert_eq!(user.id, 42);
    assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    assert!(user.name.is_none());
}

#[tokio::test]
async fn test_fetcher_reports_status_and_code() {
    let fetcher = HttpSessionFetcher::new(&spawn_auth_api().await);

    let err = fetcher.fetch_current_user(&credential("expired")).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.code(), Some("TOKEN_EXPIRED"));

    let err = fetcher.fetch_current_user(&credential("pending")).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.code(), Some("AUTHORIZATION_REQUIRED"));

    // A rejection without a JSON body still carries its status.
    let err = fetcher.fetch_current_user(&credential("other")).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Rejected {
            status: 500,
            code: None
        }
    );
}

#[tokio::test]
async fn test_fetcher_malformed_profile_is_transport_error() {
    let fetcher = HttpSessionFetcher::new(&spawn_auth_api().await);
    let err = fetcher.fetch_current_user(&credential("garbled")).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_fetcher_unreachable_is_transport_error() {
    // Bind then drop so nothing is listening on the port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let fetcher = HttpSessionFetcher::new(&format!("http://127.0.0.1:{port}/api"));
    let err = fetcher.fetch_current_user(&credential("good")).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

// --- Full Stack ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_guarded_page_redirects_to_login() {
    let app = spawn_app().await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .get(format!("{}/dashboard", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FOUND);
    assert_eq!(
        response.headers().get(reqwest::header::LOCATION).unwrap(),
        "/login"
    );
}

#[tokio::test]
async fn test_session_round_trip_against_auth_api() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body: SessionResponse = client
        .get(format!("{}/api/session?path=/dashboard", app.address))
        .header(reqwest::header::COOKIE, "token=good")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.session.status, SessionStatus::Authenticated);
    assert_eq!(body.session.user.map(|u| u.id), Some(42));

    let response = client
        .get(format!("{}/api/session?path=/dashboard", app.address))
        .header(reqwest::header::COOKIE, "token=expired")
        .send()
        .await
        .unwrap();
    assert!(response.headers().contains_key(reqwest::header::SET_COOKIE));
    let body: SessionResponse = response.json().await.unwrap();
    assert_eq!(body.session.status, SessionStatus::Unauthenticated);
    assert_eq!(body.redirect_to.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_openapi_document_lists_session_endpoints() {
    let app = spawn_app().await;
    let doc: serde_json::Value = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"]["/api/session"].is_object());
    assert!(doc["paths"]["/api/logout"].is_object());
}
