use portfolio_shell::{
    NavigationGuard, RouteClassification,
    config::{LEGACY_PUBLIC_PATHS, TOKENIZED_PUBLIC_PATHS},
    guard::GuardDecision,
};

fn guard_for(paths: &[&str]) -> NavigationGuard {
    NavigationGuard::new(
        RouteClassification::new(paths.iter().map(|p| p.to_string()).collect()),
        "/login",
    )
}

const PRIVATE_PATHS: [&str; 5] = ["/", "/dashboard", "/projects", "/login/extra", "/sign-up/"];

#[test]
fn test_public_paths_allowed_without_credential() {
    for list in [&LEGACY_PUBLIC_PATHS, &TOKENIZED_PUBLIC_PATHS] {
        let guard = guard_for(list);
        for path in list.iter() {
            assert_eq!(
                guard.decide(path, false),
                GuardDecision::Allow,
                "{path} should be public"
            );
        }
    }
}

#[test]
fn test_private_paths_redirect_without_credential() {
    let guard = guard_for(&LEGACY_PUBLIC_PATHS);
    for path in PRIVATE_PATHS {
        assert_eq!(
            guard.decide(path, false),
            GuardDecision::RedirectToLogin,
            "{path} should require a session"
        );
    }
}

#[test]
fn test_credential_present_never_redirects() {
    let guard = guard_for(&LEGACY_PUBLIC_PATHS);
    for path in PRIVATE_PATHS.iter().chain(LEGACY_PUBLIC_PATHS.iter()) {
        assert_eq!(guard.decide(path, true), GuardDecision::Allow);
        assert!(guard.check(path, true).is_none());
    }
}

#[test]
fn test_matching_is_exact_not_prefix() {
    let legacy = guard_for(&LEGACY_PUBLIC_PATHS);
    // The legacy list names `/verify-email`, which does not cover token links.
    assert!(legacy.is_public("/verify-email"));
    assert!(!legacy.is_public("/verify-email/abc123"));
    assert!(!legacy.is_public("/verify-email/[token]"));

    let tokenized = guard_for(&TOKENIZED_PUBLIC_PATHS);
    assert!(tokenized.is_public("/verify-email/[token]"));
    assert!(!tokenized.is_public("/verify-email"));
}

#[test]
fn test_check_produces_intent_targeting_login() {
    let guard = guard_for(&LEGACY_PUBLIC_PATHS);
    let intent = guard.check("/dashboard", false).expect("redirect expected");
    assert_eq!(intent.target, "/login");

    // Every intent is a distinct value.
    let again = guard.check("/dashboard", false).expect("redirect expected");
    assert_ne!(intent.id, again.id);
}

#[test]
fn test_custom_login_path() {
    let guard = NavigationGuard::new(
        RouteClassification::new(vec!["/signin".to_string()]),
        "/signin",
    );
    assert_eq!(guard.check("/", false).map(|i| i.target).as_deref(), Some("/signin"));
    assert_eq!(guard.login_path(), "/signin");
}

#[test]
fn test_classification_preserves_order() {
    let routes = RouteClassification::new(
        TOKENIZED_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
    );
    assert_eq!(routes.paths()[4], "/verify-email/[token]");
    assert!(routes.contains("/reset-password/[token]"));
}
