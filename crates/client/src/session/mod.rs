// Authentication state for the whole process.
//
// `SessionStore` is the only writer. Every other component gets a
// `SessionContext`, a cheap read handle onto the same state, and pulls the
// bearer token from it right before each call.

mod persistence;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use ragdesk_common::protocol::{LoginRequest, RegisterRequest};
use ragdesk_common::types::{AccountSummary, UserProfile};

use crate::gateway::{ApiError, RemoteApi};

pub use persistence::{
    from_config as persistence_from_config, FilePersistence, KeyringPersistence,
    MemoryPersistence, PersistedSession, PersistenceError, SessionPersistence,
};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    /// A login or register call is in flight.
    pub loading: bool,
    /// Human-readable reason of the last failed attempt.
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Read handle onto the session. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    state: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    /// A context that is already signed in. Used for one-off tools and tests.
    pub fn with_token(token: impl Into<String>, user: UserProfile) -> Self {
        let state = SessionState { token: Some(token.into()), user: Some(user), ..SessionState::default() };
        Self { state: Arc::new(RwLock::new(state)) }
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    /// Token for an authenticated call, or `Unauthenticated` without
    /// touching the network.
    pub fn bearer(&self) -> Result<String, ApiError> {
        self.token().ok_or(ApiError::Unauthenticated)
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns sign-in, sign-out and the durable copy of the session.
pub struct SessionStore<A: RemoteApi> {
    api: Arc<A>,
    persistence: Box<dyn SessionPersistence>,
    context: SessionContext,
    attempt_in_flight: AtomicBool,
}

/// Releases the single-attempt guard when an auth call finishes, however it
/// finishes. An attempt dropped mid-call also leaves `loading` cleared.
struct AttemptGuard<'a> {
    in_flight: &'a AtomicBool,
    context: &'a SessionContext,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.context.write().loading = false;
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

impl<A: RemoteApi> SessionStore<A> {
    pub fn new(api: Arc<A>, persistence: Box<dyn SessionPersistence>) -> Self {
        Self {
            api,
            persistence,
            context: SessionContext::default(),
            attempt_in_flight: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }

    /// Rehydrate from durable storage. A missing record leaves the session
    /// signed out; an unreadable one is logged and ignored.
    pub fn restore(&self) -> bool {
        match self.persistence.load() {
            Ok(Some(saved)) => {
                let mut state = self.context.write();
                state.token = Some(saved.token);
                state.user = Some(saved.user);
                state.error = None;
                debug!("session restored");
                true
            }
            Ok(None) => false,
            Err(error) => {
                warn!(error = %error, "ignoring unreadable saved session");
                false
            }
        }
    }

    /// Sign in. Returns `false` and records a reason on failure; never errors.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let request = LoginRequest { email: email.to_string(), password: password.to_string() };
        self.authenticate("login", LOGIN_FAILED, self.api.login(&request)).await
    }

    /// Create an account and sign in with it.
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> bool {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };
        self.authenticate("register", REGISTRATION_FAILED, self.api.register(&request)).await
    }

    async fn authenticate<F>(&self, action: &'static str, fallback: &str, call: F) -> bool
    where
        F: std::future::Future<
            Output = Result<ragdesk_common::protocol::AuthResponse, ApiError>,
        >,
    {
        if self
            .attempt_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(action, "auth attempt already in flight; ignoring");
            return false;
        }
        let _guard = AttemptGuard { in_flight: &self.attempt_in_flight, context: &self.context };

        {
            let mut state = self.context.write();
            state.loading = true;
            state.error = None;
        }

        match call.await {
            Ok(response) => {
                let saved = PersistedSession { token: response.access_token, user: response.user };
                let mut state = self.context.write();
                if let Err(error) = self.persistence.save(&saved) {
                    warn!(action, error = %error, "signed in but could not persist the session");
                }
                info!(action, user = %saved.user.email, "signed in");
                state.token = Some(saved.token);
                state.user = Some(saved.user);
                state.loading = false;
                state.error = None;
                true
            }
            Err(error) => {
                let reason = error.detail_or(fallback);
                warn!(action, error = %error, "authentication failed");
                let mut state = self.context.write();
                state.loading = false;
                state.error = Some(reason);
                false
            }
        }
    }

    /// Sign out. Durable and in-memory state are cleared under the same
    /// write lock; if the durable clear fails nothing changes.
    pub fn logout(&self) -> Result<(), PersistenceError> {
        let mut state = self.context.write();
        self.persistence.clear()?;
        let user = state.user.as_ref().map(|u| u.email.clone()).unwrap_or_default();
        *state = SessionState::default();
        info!(user = %user, "signed out");
        Ok(())
    }

    pub fn clear_error(&self) {
        self.context.write().error = None;
    }

    /// Fetch the server's view of the current account. Does not touch
    /// session state.
    pub async fn refresh_profile(&self) -> Result<AccountSummary, ApiError> {
        let token = self.context.bearer()?;
        self.api.me(&token).await
    }
}
