use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use std::{convert::Infallible, sync::Arc};

use crate::{
    config::AppConfig,
    credential::{CookieBackend, Credential, CredentialStore, MemoryBackend},
};

/// RequestCredentials Extractor Result
///
/// The Credential Store as seen by one HTTP request. The credential comes from
/// the configured cookie, or from an `Authorization: Bearer` header for API
/// clients. Absence is not a rejection: the navigation guard decides what an
/// absent credential means for the requested path.
pub struct RequestCredentials {
    pub store: CredentialStore,
    cookies: Arc<CookieBackend>,
}

impl RequestCredentials {
    /// The cookie jar to return with the response. Carries a removal cookie when
    /// the credential was cleared during the request.
    pub fn jar(&self) -> CookieJar {
        self.cookies.jar()
    }
}

/// RequestCredentials Extractor Implementation
///
/// 1. Dependency Resolution: the cookie name comes from `AppConfig`.
/// 2. Cookie lookup: a non-blank credential cookie backs the store directly, so
///    `clear()` turns into a `Set-Cookie` removal.
/// 3. Bearer fallback: the header token backs an in-memory store.
impl<S> FromRequestParts<S> for RequestCredentials
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);
        let has_cookie = jar
            .get(&config.credential_cookie)
            .is_some_and(|c| !c.value().trim().is_empty());
        let cookies = Arc::new(CookieBackend::new(config.credential_cookie.clone(), jar));

        if has_cookie {
            return Ok(Self {
                store: CredentialStore::new(cookies.clone()),
                cookies,
            });
        }

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(Credential::new);

        let backend = match bearer {
            Some(credential) => MemoryBackend::with_credential(credential),
            None => MemoryBackend::new(),
        };

        Ok(Self {
            store: CredentialStore::new(Arc::new(backend)),
            cookies,
        })
    }
}
