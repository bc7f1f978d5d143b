use std::env;

/// Public route patterns of the `legacy` profile (exact pathnames, no dynamic segments).
pub const LEGACY_PUBLIC_PATHS: [&str; 6] = [
    "/forgot-password",
    "/login-first",
    "/login",
    "/sign-up",
    "/verify-email",
    "/reset-password",
];

/// Public route patterns of the `tokenized` profile, where token links are dynamic routes.
pub const TOKENIZED_PUBLIC_PATHS: [&str; 6] = [
    "/forgot-password",
    "/reset-password",
    "/login",
    "/sign-up",
    "/verify-email/[token]",
    "/reset-password/[token]",
];

/// The machine-readable code the auth API uses for "credential is fine, extra
/// verification is pending". Failures carrying it never clear the credential.
pub const DEFAULT_AUTH_REQUIRED_CODE: &str = "AUTHORIZATION_REQUIRED";

/// AppConfig
///
/// Holds the shell's entire configuration state. Loaded once at startup and pulled
/// into handlers via `FromRef`; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and fail-fast checks.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the auth API that verifies credentials (`GET {auth_api_url}/me`).
    pub auth_api_url: String,
    // Where unauthenticated users are sent.
    pub login_path: String,
    // Ordered allow-list of route patterns reachable without a session.
    pub public_paths: Vec<String>,
    // Error code that marks a 401/403 as "verification pending" rather than stale.
    pub auth_required_code: String,
    // Name of the cookie carrying the credential.
    pub credential_cookie: String,
}

/// Env
///
/// Defines the runtime context: pretty logs and relaxed defaults locally,
/// JSON logs and mandatory settings in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// RouteProfile
///
/// Selects one of the two built-in allow-lists.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RouteProfile {
    Legacy,
    Tokenized,
}

impl RouteProfile {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tokenized" => RouteProfile::Tokenized,
            _ => RouteProfile::Legacy,
        }
    }

    pub fn public_paths(self) -> Vec<String> {
        let paths: &[&str] = match self {
            RouteProfile::Legacy => &LEGACY_PUBLIC_PATHS,
            RouteProfile::Tokenized => &TOKENIZED_PUBLIC_PATHS,
        };
        paths.iter().map(|p| p.to_string()).collect()
    }
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a non-panicking AppConfig for test setup, without needing any
    /// environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            auth_api_url: "http://localhost:4000/api".to_string(),
            login_path: "/login".to_string(),
            public_paths: RouteProfile::Legacy.public_paths(),
            auth_required_code: DEFAULT_AUTH_REQUIRED_CODE.to_string(),
            credential_cookie: "token".to_string(),
        }
    }
}

/// Splits a comma separated `PUBLIC_PATHS` value, keeping order and dropping blanks.
pub fn parse_public_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, fail-fast.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `AUTH_API_URL` is not set.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let auth_api_url = match env {
            Env::Production => {
                env::var("AUTH_API_URL").expect("FATAL: AUTH_API_URL must be set in production.")
            }
            Env::Local => env::var("AUTH_API_URL")
                .unwrap_or_else(|_| "http://localhost:4000/api".to_string()),
        };

        // An explicit PUBLIC_PATHS list wins over the named profile.
        let public_paths = match env::var("PUBLIC_PATHS") {
            Ok(raw) if !parse_public_paths(&raw).is_empty() => parse_public_paths(&raw),
            _ => RouteProfile::parse(&env::var("ROUTE_PROFILE").unwrap_or_default()).public_paths(),
        };

        let default_bind = match env {
            Env::Production => "0.0.0.0:3000",
            Env::Local => "127.0.0.1:3000",
        };

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| default_bind.to_string()),
            auth_api_url: auth_api_url.trim_end_matches('/').to_string(),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            public_paths,
            auth_required_code: env::var("AUTH_REQUIRED_CODE")
                .unwrap_or_else(|_| DEFAULT_AUTH_REQUIRED_CODE.to_string()),
            credential_cookie: env::var("CREDENTIAL_COOKIE")
                .unwrap_or_else(|_| "token".to_string()),
        }
    }
}
