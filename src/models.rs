use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::session::SessionState;

// --- Identity ---

/// UserProfile
///
/// The verified identity returned by the auth API for a valid credential.
/// Only `id` is guaranteed; the rest depends on the account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserProfile {
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

// --- Page Composition (Output Schemas) ---

/// RouterProps
///
/// The `router` prop forwarded to every page alongside its props.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct RouterProps {
    /// Route pattern of the matched page, e.g. `/verify-email/[token]`.
    pub pathname: String,
    /// The concrete path as requested, e.g. `/verify-email/abc123`.
    pub as_path: String,
    /// Dynamic segment values plus query string parameters.
    pub query: BTreeMap<String, String>,
}

/// PageEnvelope
///
/// What the server hands to the client for an allowed page request: the layout to
/// wrap the page in, the merged initial props, and the router prop.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PageEnvelope {
    pub page: String,
    pub layout: String,
    #[ts(type = "Record<string, unknown>")]
    #[schema(value_type = Object)]
    pub page_props: Map<String, Value>,
    pub router: RouterProps,
}

/// SessionResponse
///
/// Body of `GET /api/session`: the settled session plus where the client should
/// go next, if anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionResponse {
    pub session: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}
