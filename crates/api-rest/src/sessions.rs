//! In-memory onboarding sessions, one wizard per session id.
//!
//! Each session has its own lock, so a slow submit only holds up its own session. The map
//! lock is held just long enough to find a session and to prune expired ones.
//!
//! Sessions expire on two clocks, checked whenever a session is opened or looked up:
//! - open sessions untouched for the idle TTL are abandoned and dropped
//! - submitted or cancelled sessions are kept for the closed TTL so their final status can
//!   still be read back, then dropped

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use chitfund_core::{DirectoryCallbacks, OnboardingResult, OnboardingWizard, UuidService};

use crate::error::{api_error, ApiError};

pub(crate) type Wizard = OnboardingWizard<DirectoryCallbacks>;

/// How long an open session may sit untouched.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// How long a submitted or cancelled session stays readable.
pub const DEFAULT_CLOSED_TTL: Duration = Duration::from_secs(5 * 60);

pub(crate) struct Session {
    wizard: Wizard,
    last_touched: Instant,
}

pub(crate) type SessionHandle = Arc<Mutex<Session>>;

pub(crate) struct SessionStore {
    sessions: Mutex<HashMap<UuidService, SessionHandle>>,
    idle_ttl: Duration,
    closed_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL, DEFAULT_CLOSED_TTL)
    }
}

impl SessionStore {
    pub(crate) fn new(idle_ttl: Duration, closed_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
            closed_ttl,
        }
    }

    /// Opens a session for `wizard`, returning its new id and a handle to it.
    pub(crate) fn insert(&self, wizard: Wizard) -> Result<(UuidService, SessionHandle), ApiError> {
        let id = UuidService::new();
        let session = Session {
            wizard,
            last_touched: Instant::now(),
        };

        let mut sessions = self.lock()?;
        self.prune(&mut sessions);
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id.clone(), handle.clone());
        tracing::info!(session = %id, open = sessions.len(), "onboarding session opened");
        Ok((id, handle))
    }

    /// Finds the session for `id`.
    ///
    /// # Errors
    ///
    /// `400` for a malformed id, `404` for an unknown or expired one.
    pub(crate) fn handle(&self, context: &str, id: &str) -> Result<SessionHandle, ApiError> {
        let id = UuidService::parse(id).map_err(|e| {
            tracing::warn!("{} rejected: {}", context, e);
            (StatusCode::BAD_REQUEST, "Invalid session id")
        })?;

        let mut sessions = self.lock()?;
        self.prune(&mut sessions);
        sessions
            .get(&id)
            .cloned()
            .ok_or((StatusCode::NOT_FOUND, "Onboarding session not found"))
    }

    /// Runs `op` against the wizard behind `handle`, holding only that session's lock.
    pub(crate) fn run<T>(
        handle: &SessionHandle,
        context: &str,
        op: impl FnOnce(&mut Wizard) -> OnboardingResult<T>,
    ) -> Result<T, ApiError> {
        let mut session = handle.lock().map_err(|_| {
            tracing::error!("onboarding session lock poisoned");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })?;
        session.last_touched = Instant::now();

        op(&mut session.wizard).map_err(|e| api_error(context, &e))
    }

    /// [`handle`](Self::handle) followed by [`run`](Self::run).
    pub(crate) fn with_session<T>(
        &self,
        context: &str,
        id: &str,
        op: impl FnOnce(&mut Wizard) -> OnboardingResult<T>,
    ) -> Result<T, ApiError> {
        let handle = self.handle(context, id)?;
        Self::run(&handle, context, op)
    }

    /// Drops expired sessions. Sessions busy in another request are left alone.
    fn prune(&self, sessions: &mut HashMap<UuidService, SessionHandle>) {
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => {
                let ttl = if session.wizard.is_open() {
                    self.idle_ttl
                } else {
                    self.closed_ttl
                };
                now.duration_since(session.last_touched) < ttl
            }
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        });

        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::info!(dropped, open = sessions.len(), "expired onboarding sessions dropped");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UuidService, SessionHandle>>, ApiError> {
        self.sessions.lock().map_err(|_| {
            tracing::error!("onboarding session store lock poisoned");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })
    }
}
