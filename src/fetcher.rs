use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde::Deserialize;
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::sync::Semaphore;

use crate::{credential::Credential, error::FetchError, models::UserProfile};

/// SessionFetcher
///
/// Exchanges a stored credential for a verified user profile. Implementations
/// perform the network call and nothing else: they never touch the Credential
/// Store or the session state, the controller decides the consequences.
#[async_trait]
pub trait SessionFetcher: Send + Sync {
    async fn fetch_current_user(&self, credential: &Credential) -> Result<UserProfile, FetchError>;
}

/// FetcherState
///
/// The concrete type used to share the fetcher across the application state.
pub type FetcherState = Arc<dyn SessionFetcher>;

/// Error body the auth API sends with rejections.
#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
}

/// HttpSessionFetcher
///
/// Calls `GET {base_url}/me` with the credential as a Bearer token.
#[derive(Clone)]
pub struct HttpSessionFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SessionFetcher for HttpSessionFetcher {
    async fn fetch_current_user(&self, credential: &Credential) -> Result<UserProfile, FetchError> {
        let url = format!("{}/me", self.base_url);

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", credential.as_str()))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            // The body is best effort: a rejection without a parseable code is still a rejection.
            let code = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.code);
            return Err(FetchError::Rejected {
                status: status.as_u16(),
                code,
            });
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| FetchError::Transport(format!("malformed profile: {e}")))
    }
}

/// MockSessionFetcher
///
/// Scripted fetcher for tests and local development. Responses are served in
/// order; the last one repeats once the script runs dry. A gated mock holds every
/// call until `release` is called, which lets tests interleave bootstrap cycles.
#[derive(Clone)]
pub struct MockSessionFetcher {
    script: Arc<Mutex<VecDeque<Result<UserProfile, FetchError>>>>,
    fallback: Result<UserProfile, FetchError>,
    gate: Option<Arc<Semaphore>>,
    calls: Arc<AtomicUsize>,
}

impl MockSessionFetcher {
    pub fn new(response: Result<UserProfile, FetchError>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: response,
            gate: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding(user: UserProfile) -> Self {
        Self::new(Ok(user))
    }

    pub fn rejecting(status: u16, code: Option<&str>) -> Self {
        Self::new(Err(FetchError::Rejected {
            status,
            code: code.map(str::to_string),
        }))
    }

    pub fn unreachable() -> Self {
        Self::new(Err(FetchError::Transport("connection refused".to_string())))
    }

    /// Serves the given responses first, in order.
    pub fn with_script(mut responses: Vec<Result<UserProfile, FetchError>>) -> Self {
        let fallback = responses
            .pop()
            .unwrap_or_else(|| Err(FetchError::Transport("empty script".to_string())));
        let mock = Self::new(fallback);
        if let Ok(mut script) = mock.script.lock() {
            script.extend(responses);
        }
        mock
    }

    /// Every call waits for a `release` permit before answering.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `n` pending (or future) calls through the gate.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFetcher for MockSessionFetcher {
    async fn fetch_current_user(&self, _credential: &Credential) -> Result<UserProfile, FetchError> {
        // The response is picked at call time so interleaved cycles keep their order.
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone());

        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(FetchError::Transport("gate closed".to_string())),
            }
        }

        response
    }
}
