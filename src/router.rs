use tokio::sync::broadcast;

use crate::{
    bootstrap::{BootstrapController, RedirectQueue, redirect_channel},
    guard::{GuardDecision, RedirectIntent},
};

/// RouteEvent
///
/// Route-change lifecycle, as consumed by progress indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    Start(String),
    Complete(String),
    Error { url: String, reason: String },
}

/// ClientRouter
///
/// Tab-side router integration. Every push runs the navigation guard through the
/// controller; redirect intents queued by the controller are consumed here, each
/// exactly once.
pub struct ClientRouter {
    controller: BootstrapController,
    redirects: RedirectQueue,
    events: broadcast::Sender<RouteEvent>,
    pathname: String,
    history: Vec<String>,
}

impl ClientRouter {
    /// Attaches a fresh redirect queue to `controller`.
    pub fn new(controller: BootstrapController) -> Self {
        let (sink, redirects) = redirect_channel();
        controller.attach_redirects(sink);
        let (events, _) = broadcast::channel(64);
        let pathname = controller.current_path();
        Self {
            controller,
            redirects,
            events,
            pathname,
            history: Vec::new(),
        }
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// Every path this router has been on, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouteEvent> {
        self.events.subscribe()
    }

    /// push
    ///
    /// Client-side navigation to `url` (path plus optional query string).
    pub fn push(&mut self, url: &str) -> GuardDecision {
        self.send(RouteEvent::Start(url.to_string()));

        let path = url.split(['?', '#']).next().unwrap_or_default();
        if !path.starts_with('/') {
            self.send(RouteEvent::Error {
                url: url.to_string(),
                reason: "not an absolute path".to_string(),
            });
            return GuardDecision::Allow;
        }

        self.pathname = path.to_string();
        self.history.push(self.pathname.clone());
        let decision = self.controller.navigate(path);
        self.send(RouteEvent::Complete(url.to_string()));
        decision
    }

    /// settle
    ///
    /// Drains pending redirect intents, navigating to each target. Returns the
    /// intents consumed; a consumed intent is gone from the queue.
    pub fn settle(&mut self) -> Vec<RedirectIntent> {
        let mut consumed = Vec::new();
        while let Ok(intent) = self.redirects.try_recv() {
            tracing::debug!(id = %intent.id, target = %intent.target, "redirect intent consumed");
            if intent.target != self.pathname {
                self.push(&intent.target);
            }
            consumed.push(intent);
        }
        consumed
    }

    fn send(&self, event: RouteEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
