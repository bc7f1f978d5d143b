use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// CredentialError
///
/// Failures of the storage layer behind the Credential Store. These never leave
/// the store: `has()` reads them as "no credential".
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),
}

/// FetchError
///
/// Failure contract of the Auth Session Fetcher: either the auth API answered with
/// a non-success status (and possibly a machine-readable code), or the call never
/// produced a response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("auth api rejected the credential with status {status} (code: {code:?})")]
    Rejected { status: u16, code: Option<String> },
    #[error("auth api unreachable: {0}")]
    Transport(String),
}

/// FailureClass
///
/// How the Bootstrap Controller must react to a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The credential is stale or invalid: clear it and send the user to login.
    StaleCredential,
    /// Network error, server error, or the "authorization required" sentinel:
    /// keep the credential and leave the session as it was.
    Transient,
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Rejected { status, .. } => Some(*status),
            FetchError::Transport(_) => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            FetchError::Rejected { code, .. } => code.as_deref(),
            FetchError::Transport(_) => None,
        }
    }

    /// Classifies the failure against the configured sentinel code.
    pub fn class(&self, auth_required_code: &str) -> FailureClass {
        match self {
            FetchError::Rejected { status: 401 | 403, code }
                if code.as_deref() != Some(auth_required_code) =>
            {
                FailureClass::StaleCredential
            }
            _ => FailureClass::Transient,
        }
    }
}

/// ShellError
///
/// Errors that can reach the HTTP boundary. Fetch failures are always classified
/// by the controller and never surface here.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("initial props hook `{hook}` failed: {reason}")]
    InitialProps { hook: String, reason: String },
}

impl IntoResponse for ShellError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "page resolution failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
    }
}
