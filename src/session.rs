use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::UserProfile;

/// SessionStatus
///
/// The shell's current belief about who is signed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum SessionStatus {
    #[default]
    Unknown,
    Loading,
    Authenticated,
    Unauthenticated,
}

/// SessionState
///
/// Snapshot published to readers. `user` is present only while `status` is
/// `Authenticated`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct SessionState {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    /// Bootstrap cycle that last wrote this state (0 before the first cycle).
    pub generation: u64,
    #[ts(type = "string | null")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

/// SessionContext
///
/// Explicit, shared session context. Anyone may read or subscribe; only the
/// Bootstrap Controller holds the `SessionWriter`.
#[derive(Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub(crate) fn writer(&self) -> SessionWriter {
        SessionWriter {
            tx: Arc::clone(&self.tx),
        }
    }
}

/// Write handle, handed out to the controller only.
#[derive(Clone)]
pub(crate) struct SessionWriter {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionWriter {
    pub(crate) fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub(crate) fn loading(&self, generation: u64) {
        self.tx.send_modify(|state| {
            state.status = SessionStatus::Loading;
            state.user = None;
            state.generation = generation;
        });
    }

    pub(crate) fn authenticated(&self, generation: u64, user: UserProfile) -> SessionState {
        self.replace(SessionState {
            status: SessionStatus::Authenticated,
            user: Some(user),
            generation,
            checked_at: Some(Utc::now()),
        })
    }

    /// Also serves as the logout dispatch: drops the user.
    pub(crate) fn unauthenticated(&self, generation: u64) -> SessionState {
        self.replace(SessionState {
            status: SessionStatus::Unauthenticated,
            user: None,
            generation,
            checked_at: Some(Utc::now()),
        })
    }

    /// Puts back the last settled state, clearing `Loading`.
    pub(crate) fn restore(&self, generation: u64, settled: SessionState) -> SessionState {
        self.replace(SessionState {
            generation,
            checked_at: Some(Utc::now()),
            ..settled
        })
    }

    fn replace(&self, state: SessionState) -> SessionState {
        self.tx.send_replace(state.clone());
        state
    }
}
