use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::watch;

use crate::error::CredentialError;

/// Credential
///
/// Opaque proof of a prior login. Holding one says nothing about its validity;
/// only a successful session fetch does.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token. Blank tokens are not credentials.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// CredentialBackend
///
/// The persistence seam behind the Credential Store. Implementations are
/// synchronous and never touch the network.
pub trait CredentialBackend: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, CredentialError>;
    fn store(&self, credential: Credential) -> Result<(), CredentialError>;
    fn remove(&self) -> Result<(), CredentialError>;
}

/// MemoryBackend
///
/// Tab-side storage. Can be built in a failing mode to exercise the
/// storage-error path.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<Credential>>,
    should_fail: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn new_failing() -> Self {
        Self {
            slot: Mutex::new(None),
            should_fail: AtomicBool::new(true),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CredentialError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(CredentialError::Unavailable(
                "memory backend failure requested".to_string(),
            ));
        }
        Ok(())
    }
}

impl CredentialBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        self.check()?;
        let slot = self
            .slot
            .lock()
            .map_err(|_| CredentialError::Unavailable("poisoned slot".to_string()))?;
        Ok(slot.clone())
    }

    fn store(&self, credential: Credential) -> Result<(), CredentialError> {
        self.check()?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CredentialError::Unavailable("poisoned slot".to_string()))?;
        *slot = Some(credential);
        Ok(())
    }

    fn remove(&self) -> Result<(), CredentialError> {
        self.check()?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CredentialError::Unavailable("poisoned slot".to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// CookieBackend
///
/// Request-scoped storage over the incoming cookie jar. Writes are recorded in the
/// jar so the HTTP adapter can return them as `Set-Cookie` headers.
pub struct CookieBackend {
    name: String,
    jar: Mutex<CookieJar>,
}

impl CookieBackend {
    pub fn new(name: impl Into<String>, jar: CookieJar) -> Self {
        Self {
            name: name.into(),
            jar: Mutex::new(jar),
        }
    }

    /// The jar including any pending additions/removals, for the response.
    pub fn jar(&self) -> CookieJar {
        match self.jar.lock() {
            Ok(jar) => jar.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn with_jar<T>(&self, f: impl FnOnce(&mut CookieJar) -> T) -> Result<T, CredentialError> {
        let mut jar = self
            .jar
            .lock()
            .map_err(|_| CredentialError::Unavailable("poisoned cookie jar".to_string()))?;
        Ok(f(&mut jar))
    }
}

impl CredentialBackend for CookieBackend {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        self.with_jar(|jar| jar.get(&self.name).and_then(|c| Credential::new(c.value())))
    }

    fn store(&self, credential: Credential) -> Result<(), CredentialError> {
        self.with_jar(|jar| {
            let mut cookie = Cookie::new(self.name.clone(), credential.as_str().to_string());
            cookie.set_path("/");
            cookie.set_http_only(true);
            *jar = jar.clone().add(cookie);
        })
    }

    fn remove(&self) -> Result<(), CredentialError> {
        self.with_jar(|jar| {
            let mut removal = Cookie::new(self.name.clone(), "");
            removal.set_path("/");
            removal.make_removal();
            *jar = jar.clone().add(removal);
        })
    }
}

/// CredentialStore
///
/// Exposes whether a credential exists and publishes every change of that fact to
/// subscribers. Storage errors are logged and read as "absent".
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn CredentialBackend>,
    presence: Arc<watch::Sender<bool>>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        let (presence, _) = watch::channel(false);
        let store = Self {
            backend,
            presence: Arc::new(presence),
        };
        store.publish(store.credential().is_some());
        store
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// has
    ///
    /// Pure read of the persisted state.
    pub fn has(&self) -> bool {
        self.credential().is_some()
    }

    pub fn credential(&self) -> Option<Credential> {
        match self.backend.load() {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "credential read failed, treating as absent");
                None
            }
        }
    }

    /// Persists a credential produced by a login.
    pub fn set(&self, credential: Credential) {
        if let Err(e) = self.backend.store(credential) {
            tracing::warn!(error = %e, "credential write failed");
        }
        self.publish(self.has());
    }

    /// clear
    ///
    /// Removes the persisted credential. Idempotent.
    pub fn clear(&self) {
        if let Err(e) = self.backend.remove() {
            tracing::warn!(error = %e, "credential removal failed");
        }
        self.publish(self.has());
    }

    /// Receiver that changes whenever credential presence flips.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.presence.subscribe()
    }

    fn publish(&self, present: bool) {
        self.presence.send_if_modified(|current| {
            if *current == present {
                false
            } else {
                *current = present;
                true
            }
        });
    }
}
