use uuid::Uuid;

/// RouteClassification
///
/// The ordered allow-list of route patterns reachable without a session.
/// Built once from configuration and only ever read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteClassification {
    public_paths: Vec<String>,
}

impl RouteClassification {
    pub fn new(public_paths: Vec<String>) -> Self {
        Self { public_paths }
    }

    /// Exact string membership. `/verify-email` does not cover `/verify-email/abc`;
    /// dynamic routes are listed by their pattern (`/verify-email/[token]`).
    pub fn contains(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[String] {
        &self.public_paths
    }
}

/// GuardDecision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
}

/// RedirectIntent
///
/// A decision to send the user somewhere else, independent of how the redirect
/// is carried out (HTTP 302 on the server, a router push on the client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectIntent {
    pub id: Uuid,
    pub target: String,
}

impl RedirectIntent {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
        }
    }
}

/// NavigationGuard
///
/// Per-route authentication policy. Pure: it decides, adapters act.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    routes: RouteClassification,
    login_path: String,
}

impl NavigationGuard {
    pub fn new(routes: RouteClassification, login_path: impl Into<String>) -> Self {
        Self {
            routes,
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn routes(&self) -> &RouteClassification {
        &self.routes
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.routes.contains(path)
    }

    /// decide
    ///
    /// `RedirectToLogin` iff there is no credential and the path is not public.
    pub fn decide(&self, path: &str, credential_present: bool) -> GuardDecision {
        if !credential_present && !self.is_public(path) {
            GuardDecision::RedirectToLogin
        } else {
            GuardDecision::Allow
        }
    }

    /// Same decision, expressed as the intent to hand to a redirect adapter.
    pub fn check(&self, path: &str, credential_present: bool) -> Option<RedirectIntent> {
        match self.decide(path, credential_present) {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin => {
                tracing::debug!(path, target = %self.login_path, "guard denied navigation");
                Some(RedirectIntent::to(self.login_path.clone()))
            }
        }
    }
}
