use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, Method, header},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session bootstrap core, leaf-first.
pub mod credential;
pub mod error;
pub mod fetcher;
pub mod guard;
pub mod session;
pub mod bootstrap;
pub mod layout;
pub mod pages;
pub mod router;

// HTTP surface and wiring.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod site;

pub mod routes;
use routes::{public, session as session_api};

// --- Public Re-exports ---

pub use bootstrap::{BootstrapController, ServerBootstrap};
pub use config::AppConfig;
pub use credential::CredentialStore;
pub use fetcher::{FetcherState, HttpSessionFetcher, MockSessionFetcher};
pub use guard::{NavigationGuard, RouteClassification};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_session, handlers::logout),
    components(
        schemas(
            models::UserProfile, models::SessionResponse, models::PageEnvelope,
            models::RouterProps, session::SessionState, session::SessionStatus,
        )
    ),
    tags(
        (name = "portfolio-shell", description = "Session bootstrap and page shell API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for everything the handlers need. Per-request
/// and per-tab session state never lives here.
#[derive(Clone)]
pub struct AppState {
    /// Verifies credentials against the auth API.
    pub fetcher: FetcherState,
    /// Guard, page registry and layout resolver for server-side evaluation.
    pub shell: Arc<ServerBootstrap>,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the portfolio site's pages behind a guard built from `config`.
    pub fn new(config: AppConfig, fetcher: FetcherState) -> Self {
        let guard = NavigationGuard::new(
            RouteClassification::new(config.public_paths.clone()),
            config.login_path.clone(),
        );
        let shell = ServerBootstrap::new(guard, site::registry(), site::resolver());
        Self {
            fetcher,
            shell: Arc::new(shell),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes, applies the observability layers and registers the
/// application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: the front-end reads the session over GET and logs out over POST.
    // `Location` is exposed so a fetch-based client can follow a guard redirect.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::LOCATION]);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", session_api::session_routes())
        // Pages last: the public router owns the guarded fallback.
        .merge(public::public_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request, carrying the `x-request-id` so every log line of a
/// bootstrap cycle or guard decision can be correlated. Page requests record
/// the path the guard will classify; API calls are tagged as such.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    let path = request.uri().path();
    let kind = if path.starts_with("/api")
        || path.starts_with("/swagger-ui")
        || path == "/health"
    {
        "api"
    } else {
        "page"
    };
    let has_cookie = request.headers().contains_key(header::COOKIE);

    tracing::info_span!(
        "shell_request",
        method = %request.method(),
        kind,
        path = %path,
        has_cookie,
        req_id = %request_id,
    )
}
