use portfolio_shell::{
    error::{FailureClass, FetchError},
    models::{SessionResponse, UserProfile},
    session::{SessionState, SessionStatus},
};
use serde_json::json;

// --- Serialization ---

#[test]
fn test_status_serializes_screaming_case() {
    assert_eq!(serde_json::to_value(SessionStatus::Authenticated).unwrap(), json!("AUTHENTICATED"));
    assert_eq!(serde_json::to_value(SessionStatus::Unknown).unwrap(), json!("UNKNOWN"));
    assert_eq!(SessionStatus::default(), SessionStatus::Unknown);
}

#[test]
fn test_profile_omits_missing_fields() {
    let value = serde_json::to_value(UserProfile::with_id(1)).unwrap();
    assert_eq!(value, json!({ "id": 1 }));
}

#[test]
fn test_profile_tolerates_extra_fields() {
    let user: UserProfile = serde_json::from_value(json!({
        "id": 5,
        "name": "Ada",
        "avatar": "ignored.png"
    }))
    .unwrap();
    assert_eq!(user.id, 5);
    assert_eq!(user.name.as_deref(), Some("Ada"));
}

#[test]
fn test_session_response_without_redirect() {
    let body = SessionResponse {
        session: SessionState::default(),
        redirect_to: None,
    };
    let value = serde_json::to_value(&body).unwrap();
    assert!(value.get("redirect_to").is_none());
    assert_eq!(value["session"]["status"], json!("UNKNOWN"));
    assert_eq!(value["session"]["user"], json!(null));
}

#[test]
fn test_authenticated_state_carries_user() {
    let state = SessionState {
        status: SessionStatus::Authenticated,
        user: Some(UserProfile::with_id(9)),
        ..SessionState::default()
    };
    assert!(state.is_authenticated());
    assert!(!SessionState::default().is_authenticated());
}

// --- Failure Classification ---

const SENTINEL: &str = "AUTHORIZATION_REQUIRED";

fn rejected(status: u16, code: Option<&str>) -> FetchError {
    FetchError::Rejected {
        status,
        code: code.map(str::to_string),
    }
}

#[test]
fn test_unauthorized_and_forbidden_are_stale() {
    assert_eq!(rejected(401, None).class(SENTINEL), FailureClass::StaleCredential);
    assert_eq!(rejected(403, None).class(SENTINEL), FailureClass::StaleCredential);
    assert_eq!(
        rejected(401, Some("TOKEN_EXPIRED")).class(SENTINEL),
        FailureClass::StaleCredential
    );
}

#[test]
fn test_sentinel_code_is_transient() {
    assert_eq!(rejected(401, Some(SENTINEL)).class(SENTINEL), FailureClass::Transient);
    assert_eq!(rejected(403, Some(SENTINEL)).class(SENTINEL), FailureClass::Transient);
    // A different configured sentinel changes the outcome.
    assert_eq!(
        rejected(401, Some(SENTINEL)).class("MFA_PENDING"),
        FailureClass::StaleCredential
    );
}

#[test]
fn test_other_failures_are_transient() {
    for status in [400, 404, 429, 500, 502, 503] {
        assert_eq!(rejected(status, None).class(SENTINEL), FailureClass::Transient);
    }
    assert_eq!(
        FetchError::Transport("timeout".to_string()).class(SENTINEL),
        FailureClass::Transient
    );
}
