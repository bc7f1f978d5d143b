use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    credential::CredentialStore,
    error::{FailureClass, FetchError, ShellError},
    fetcher::FetcherState,
    guard::{GuardDecision, NavigationGuard, RedirectIntent},
    layout::{AppContext, LayoutResolver},
    models::{PageEnvelope, RouterProps, UserProfile},
    pages::PageRegistry,
    session::{SessionContext, SessionState, SessionStatus, SessionWriter},
};

/// BootstrapPhase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    Init,
    Checking,
    Ready,
    Redirecting,
}

/// What the caller may render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderGate {
    /// Blocking loading indicator, no page content.
    Loading,
    /// A redirect is pending; render nothing.
    Redirecting,
    Render,
}

/// CycleOutcome
///
/// How a bootstrap cycle settled. Every fetch failure is classified here; none
/// propagates further.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoCredential,
    Authenticated(UserProfile),
    StaleCredential { redirect: Option<RedirectIntent> },
    Transient(FetchError),
    /// A newer cycle started while this one was in flight; nothing was applied.
    Superseded,
}

/// Where redirect intents go for the router integration to consume.
pub type RedirectSink = mpsc::UnboundedSender<RedirectIntent>;
pub type RedirectQueue = mpsc::UnboundedReceiver<RedirectIntent>;

pub fn redirect_channel() -> (RedirectSink, RedirectQueue) {
    mpsc::unbounded_channel()
}

/// Bookkeeping guarded by one lock so a generation check and the write it
/// protects cannot interleave with a newer cycle.
struct CycleState {
    generation: u64,
    current_path: String,
    /// Last state a cycle settled on; never `Loading`.
    settled: SessionState,
    /// The guard denied `current_path` and no allowed navigation followed yet.
    denied: bool,
}

struct Inner {
    credentials: CredentialStore,
    fetcher: FetcherState,
    guard: NavigationGuard,
    pages: PageRegistry,
    session: SessionContext,
    writer: SessionWriter,
    auth_required_code: String,
    phase: watch::Sender<BootstrapPhase>,
    cycle: Mutex<CycleState>,
    redirects: Mutex<Option<RedirectSink>>,
}

/// BootstrapController
///
/// Sole writer of the session state. Resolves, per credential-presence change,
/// whether the user is authenticated; the latest cycle always wins.
#[derive(Clone)]
pub struct BootstrapController {
    inner: Arc<Inner>,
}

impl BootstrapController {
    pub fn new(
        credentials: CredentialStore,
        fetcher: FetcherState,
        guard: NavigationGuard,
        pages: PageRegistry,
        session: SessionContext,
        auth_required_code: impl Into<String>,
    ) -> Self {
        let (phase, _) = watch::channel(BootstrapPhase::Init);
        let writer = session.writer();
        let settled = match writer.current() {
            state if state.status == SessionStatus::Loading => SessionState::default(),
            state => state,
        };
        Self {
            inner: Arc::new(Inner {
                credentials,
                fetcher,
                guard,
                pages,
                session,
                writer,
                auth_required_code: auth_required_code.into(),
                phase,
                cycle: Mutex::new(CycleState {
                    generation: 0,
                    current_path: "/".to_string(),
                    settled,
                    denied: false,
                }),
                redirects: Mutex::new(None),
            }),
        }
    }

    /// Routes emitted redirect intents into `sink`, replacing any previous one.
    pub fn attach_redirects(&self, sink: RedirectSink) {
        if let Ok(mut redirects) = self.inner.redirects.lock() {
            *redirects = Some(sink);
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.inner.guard
    }

    pub fn phase(&self) -> BootstrapPhase {
        *self.inner.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<BootstrapPhase> {
        self.inner.phase.subscribe()
    }

    /// render_gate
    ///
    /// Nothing of the page renders until the first cycle has settled.
    pub fn render_gate(&self) -> RenderGate {
        match self.phase() {
            BootstrapPhase::Init | BootstrapPhase::Checking => RenderGate::Loading,
            BootstrapPhase::Redirecting => RenderGate::Redirecting,
            BootstrapPhase::Ready => RenderGate::Render,
        }
    }

    pub fn current_path(&self) -> String {
        self.lock_cycle().current_path.clone()
    }

    /// Records the current path without running the guard.
    pub fn set_current_path(&self, path: &str) {
        self.lock_cycle().current_path = path.to_string();
    }

    /// navigate
    ///
    /// Client-side guard check on every path change. Classifies the matched
    /// page's route pattern, as the server does. A denial emits a redirect
    /// intent; it is never an error.
    pub fn navigate(&self, path: &str) -> GuardDecision {
        let present = self.inner.credentials.has();
        let route = self.inner.pages.route_for(path);
        let intent = self.inner.guard.check(route, present);
        {
            let mut cycle = self.lock_cycle();
            cycle.current_path = path.to_string();
            cycle.denied = intent.is_some();
        }

        match intent {
            Some(intent) => {
                self.set_phase(BootstrapPhase::Redirecting);
                self.emit(intent);
                GuardDecision::RedirectToLogin
            }
            None => {
                if self.phase() == BootstrapPhase::Redirecting {
                    self.set_phase(BootstrapPhase::Ready);
                }
                GuardDecision::Allow
            }
        }
    }

    /// run_cycle
    ///
    /// One bootstrap cycle: Init/Ready -> Checking -> Ready.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let generation = {
            let mut cycle = self.lock_cycle();
            cycle.generation += 1;
            self.set_phase(BootstrapPhase::Checking);
            cycle.generation
        };
        tracing::debug!(generation, "bootstrap cycle started");

        let Some(credential) = self.inner.credentials.credential() else {
            let applied = self.commit(generation, |cycle| {
                cycle.settled = self.inner.writer.unauthenticated(generation);
                self.settle_phase(cycle);
                CycleOutcome::NoCredential
            });
            return self.settled(generation, applied);
        };

        if self
            .commit(generation, |_| self.inner.writer.loading(generation))
            .is_none()
        {
            return CycleOutcome::Superseded;
        }

        let result = self.inner.fetcher.fetch_current_user(&credential).await;

        let applied = self.commit(generation, |cycle| {
            let outcome = self.apply_fetch(generation, cycle, result);
            self.settle_phase(cycle);
            outcome
        });

        self.settled(generation, applied)
    }

    fn apply_fetch(
        &self,
        generation: u64,
        cycle: &mut CycleState,
        result: Result<UserProfile, FetchError>,
    ) -> CycleOutcome {
        match result {
            Ok(user) => {
                cycle.settled = self.inner.writer.authenticated(generation, user.clone());
                CycleOutcome::Authenticated(user)
            }
            Err(e) => match e.class(&self.inner.auth_required_code) {
                FailureClass::StaleCredential => {
                    tracing::info!(error = %e, generation, "stale credential, clearing");
                    self.inner.credentials.clear();
                    cycle.settled = self.inner.writer.unauthenticated(generation);
                    let login = self.inner.guard.login_path();
                    let redirect = (cycle.current_path != login)
                        .then(|| RedirectIntent::to(login.to_string()));
                    if let Some(intent) = &redirect {
                        self.emit(intent.clone());
                    }
                    CycleOutcome::StaleCredential { redirect }
                }
                FailureClass::Transient => {
                    tracing::warn!(error = %e, generation, "session fetch failed, keeping credential");
                    cycle.settled = self.inner.writer.restore(generation, cycle.settled.clone());
                    CycleOutcome::Transient(e)
                }
            },
        }
    }

    /// spawn
    ///
    /// Runs a cycle now (the mount) and again on every credential-presence change,
    /// aborting the cycle it supersedes.
    pub fn spawn(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let mut presence = self.inner.credentials.subscribe();
        tokio::spawn(async move {
            let mut in_flight: Option<JoinHandle<CycleOutcome>> = None;
            loop {
                if let Some(task) = in_flight.take() {
                    task.abort();
                }
                let cycle = controller.clone();
                in_flight = Some(tokio::spawn(async move { cycle.run_cycle().await }));

                if presence.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn settled(&self, generation: u64, applied: Option<CycleOutcome>) -> CycleOutcome {
        match applied {
            Some(outcome) => {
                tracing::debug!(generation, ?outcome, "bootstrap cycle settled");
                outcome
            }
            None => {
                tracing::debug!(generation, "bootstrap cycle superseded, result dropped");
                CycleOutcome::Superseded
            }
        }
    }

    /// Runs `apply` only if `generation` is still the latest cycle. `None` when the
    /// cycle was superseded.
    fn commit<T>(&self, generation: u64, apply: impl FnOnce(&mut CycleState) -> T) -> Option<T> {
        let mut cycle = self.lock_cycle();
        if cycle.generation != generation {
            return None;
        }
        Some(apply(&mut cycle))
    }

    /// Ends a cycle in `Ready`, unless a guard denial for the current path is
    /// still pending and still holds.
    fn settle_phase(&self, cycle: &CycleState) {
        let still_denied = cycle.denied
            && self
                .inner
                .guard
                .decide(
                    self.inner.pages.route_for(&cycle.current_path),
                    self.inner.credentials.has(),
                )
                == GuardDecision::RedirectToLogin;
        self.set_phase(if still_denied {
            BootstrapPhase::Redirecting
        } else {
            BootstrapPhase::Ready
        });
    }

    fn emit(&self, intent: RedirectIntent) {
        tracing::debug!(id = %intent.id, target = %intent.target, "redirect intent emitted");
        if let Ok(redirects) = self.inner.redirects.lock() {
            if let Some(sink) = redirects.as_ref() {
                let _ = sink.send(intent);
            }
        }
    }

    fn set_phase(&self, phase: BootstrapPhase) {
        self.inner.phase.send_replace(phase);
    }

    fn lock_cycle(&self) -> MutexGuard<'_, CycleState> {
        match self.inner.cycle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// --- Server-side evaluation ---

/// PageRequest
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

/// ServerOutcome
#[derive(Debug, Clone, PartialEq)]
pub enum ServerOutcome {
    Redirect(RedirectIntent),
    Render(PageEnvelope),
    NotFound,
}

/// ServerBootstrap
///
/// The one-shot, per-request evaluation: guard first, and only an allowed request
/// reaches layout resolution.
#[derive(Clone)]
pub struct ServerBootstrap {
    guard: NavigationGuard,
    pages: PageRegistry,
    resolver: LayoutResolver,
}

impl ServerBootstrap {
    pub fn new(guard: NavigationGuard, pages: PageRegistry, resolver: LayoutResolver) -> Self {
        Self {
            guard,
            pages,
            resolver,
        }
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn pages(&self) -> &PageRegistry {
        &self.pages
    }

    /// evaluate_request
    ///
    /// The guard checks the page's route pattern, or the raw path when no page
    /// matches.
    pub async fn evaluate_request(
        &self,
        request: &PageRequest,
        credential_present: bool,
    ) -> Result<ServerOutcome, ShellError> {
        let matched = self.pages.find(&request.path);
        let pathname = matched
            .as_ref()
            .map_or(request.path.as_str(), |m| m.page.pattern.as_str());

        if let Some(intent) = self.guard.check(pathname, credential_present) {
            return Ok(ServerOutcome::Redirect(intent));
        }

        let Some(matched) = matched else {
            return Ok(ServerOutcome::NotFound);
        };

        let mut query = request.query.clone();
        query.extend(matched.params.clone());

        let ctx = AppContext {
            pathname: pathname.to_string(),
            as_path: request.path.clone(),
            query: query.clone(),
            credential_present,
            page_props: Default::default(),
        };
        let resolved = self.resolver.resolve(matched.page, &ctx).await?;

        Ok(ServerOutcome::Render(PageEnvelope {
            page: matched.page.name.clone(),
            layout: resolved.layout,
            page_props: resolved.page_props,
            router: RouterProps {
                pathname: ctx.pathname,
                as_path: ctx.as_path,
                query,
            },
        }))
    }
}
