use axum::http::{HeaderMap, HeaderValue, header};
use axum_extra::extract::cookie::CookieJar;
use portfolio_shell::credential::{
    CookieBackend, Credential, CredentialBackend, CredentialStore, MemoryBackend,
};
use std::sync::Arc;

fn token(raw: &str) -> Credential {
    Credential::new(raw).expect("non-blank token")
}

#[cfg(test)]
mod memory_tests {
    use super::*;

    #[test]
    fn test_blank_token_is_not_a_credential() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert!(Credential::new("abc").is_some());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", token("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_set_then_has() {
        let store = CredentialStore::in_memory();
        assert!(!store.has());

        store.set(token("abc"));
        assert!(store.has());
        assert_eq!(store.credential().map(|c| c.as_str().to_string()).as_deref(), Some("abc"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = CredentialStore::new(Arc::new(MemoryBackend::with_credential(token("abc"))));
        assert!(store.has());

        store.clear();
        let after_once = store.has();
        store.clear();
        let after_twice = store.has();

        assert!(!after_once);
        assert_eq!(after_once, after_twice);
    }

    #[test]
    fn test_storage_error_reads_as_absent() {
        let backend = Arc::new(MemoryBackend::with_credential(token("abc")));
        let store = CredentialStore::new(backend.clone());
        assert!(store.has());

        backend.set_failing(true);
        assert!(!store.has());
        // Clearing through a broken backend must not panic either.
        store.clear();

        backend.set_failing(false);
        assert!(store.has());
    }

    #[test]
    fn test_failing_backend_never_reports_credential() {
        let store = CredentialStore::new(Arc::new(MemoryBackend::new_failing()));
        store.set(token("abc"));
        assert!(!store.has());
    }

    #[tokio::test]
    async fn test_presence_changes_are_published() {
        let store = CredentialStore::in_memory();
        let mut presence = store.subscribe();
        assert!(!*presence.borrow());

        store.set(token("abc"));
        presence.changed().await.expect("sender alive");
        assert!(*presence.borrow_and_update());

        // Replacing one credential with another is not a presence change.
        store.set(token("def"));
        assert!(!presence.has_changed().expect("sender alive"));

        store.clear();
        presence.changed().await.expect("sender alive");
        assert!(!*presence.borrow_and_update());
    }
}

#[cfg(test)]
mod cookie_tests {
    use super::*;

    fn jar_with(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_reads_named_cookie() {
        let backend = CookieBackend::new("token", jar_with("token=abc; theme=dark"));
        let loaded = backend.load().unwrap();
        assert_eq!(loaded.map(|c| c.as_str().to_string()).as_deref(), Some("abc"));
    }

    #[test]
    fn test_other_cookies_are_not_credentials() {
        let backend = CookieBackend::new("token", jar_with("theme=dark"));
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn test_remove_leaves_removal_cookie_in_jar() {
        let backend = Arc::new(CookieBackend::new("token", jar_with("token=abc")));
        let store = CredentialStore::new(backend.clone());
        assert!(store.has());

        store.clear();
        assert!(!store.has());

        let jar = backend.jar();
        let removal = jar.get("token").expect("removal cookie recorded");
        assert_eq!(removal.value(), "");
        assert_eq!(removal.path(), Some("/"));
    }
}
