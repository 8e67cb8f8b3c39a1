//! Session manager - manual and biometric login, restore and logout
//!
//! State machine: `Unauthenticated -> Authenticating -> Authenticated ->
//! Unauthenticated`. Only one attempt may be in flight; the remote exchange
//! runs only while the state is `Authenticating`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::result::{Error, Result};
use crate::domain::{AuthGrant, Identity, Session, SessionState};
use crate::ports::{BankApi, BiometricOutcome, CredentialStore};
use crate::services::biometric_gate::BiometricGate;
use crate::services::logging::{record, LogEvent, LoggingService};

/// Result of a launch-time restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Biometric unlock succeeded (or a session was already active)
    Restored(Session),
    /// Preconditions for biometric unlock are not met; show the login form
    ManualLoginRequired,
}

/// Owns the session lifecycle
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    api: Arc<dyn BankApi>,
    gate: BiometricGate,
    state: Mutex<SessionState>,
    logger: Option<Arc<LoggingService>>,
}

/// Marks an attempt in flight. Dropping it without `finish` (error return or
/// a cancelled future) puts the manager back to `Unauthenticated`.
struct Attempt<'a> {
    state: &'a Mutex<SessionState>,
    finished: bool,
}

impl Attempt<'_> {
    fn finish(mut self, session: Session) {
        *lock(self.state) = SessionState::Authenticated(session);
        self.finished = true;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *lock(self.state) = SessionState::Unauthenticated;
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, api: Arc<dyn BankApi>, gate: BiometricGate) -> Self {
        Self {
            store,
            api,
            gate,
            state: Mutex::new(SessionState::Unauthenticated),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        lock(&self.state).clone()
    }

    /// The active session, if any
    pub fn current(&self) -> Option<Session> {
        lock(&self.state).session().cloned()
    }

    /// Active session or `NotAuthenticated`
    pub fn require(&self) -> Result<Session> {
        self.current().ok_or(Error::NotAuthenticated)
    }

    pub fn gate(&self) -> &BiometricGate {
        &self.gate
    }

    fn log(&self, event: LogEvent) {
        record(self.logger.as_deref(), event);
    }

    fn begin(&self) -> Result<Attempt<'_>> {
        let mut state = lock(&self.state);
        match *state {
            SessionState::Authenticating => Err(Error::Busy),
            SessionState::Authenticated(_) => Err(Error::SessionActive),
            SessionState::Unauthenticated => {
                *state = SessionState::Authenticating;
                Ok(Attempt {
                    state: &self.state,
                    finished: false,
                })
            }
        }
    }

    /// Exchange an identity for a session and persist the token
    async fn exchange(&self, identity: Identity, screen: &str) -> Result<Session> {
        let grant: AuthGrant = match self.api.authenticate(&identity).await {
            Ok(grant) => grant,
            Err(e) => {
                let event = match e {
                    Error::AuthRejected(_) => "login_rejected",
                    _ => "login_failed",
                };
                self.log(LogEvent::new(event).with_screen(screen).with_error(e.to_string()));
                return Err(e);
            }
        };

        // The previous token and profile may belong to another alias
        self.store.clear_token().await?;
        self.store.save_token(&grant.token).await?;
        if let Some(profile) = &grant.profile {
            self.store.save_profile(profile).await?;
        }
        self.log(LogEvent::new("login_succeeded").with_screen(screen));

        Ok(Session::new(identity, grant))
    }

    /// Manual login
    ///
    /// Input is validated before anything else happens. A valid identity is
    /// saved before the exchange and stays saved if the server rejects it.
    pub async fn login(&self, alias: &str, secret: &str) -> Result<Session> {
        let identity = Identity::parse(alias, secret)?;
        let attempt = self.begin()?;

        self.store.save(&identity).await?;
        let session = self.exchange(identity, "login").await?;

        attempt.finish(session.clone());
        Ok(session)
    }

    /// Launch-time biometric unlock
    ///
    /// The gate is only consulted when biometric login is opted in, an
    /// identity is stored, and the device reports support and enrollment.
    /// A declined or failed challenge is a recoverable error; stored
    /// credentials are never touched.
    pub async fn restore(&self) -> Result<RestoreOutcome> {
        match &*lock(&self.state) {
            SessionState::Authenticated(session) => {
                return Ok(RestoreOutcome::Restored(session.clone()))
            }
            SessionState::Authenticating => return Err(Error::Busy),
            SessionState::Unauthenticated => {}
        }

        if !self.store.biometric_preference().await? {
            return Ok(RestoreOutcome::ManualLoginRequired);
        }
        let Some(identity) = self.store.load().await? else {
            return Ok(RestoreOutcome::ManualLoginRequired);
        };
        if !self.gate.is_available().await {
            self.log(LogEvent::new("biometric_unavailable").with_screen("unlock"));
            return Ok(RestoreOutcome::ManualLoginRequired);
        }

        let attempt = self.begin()?;

        match self.gate.challenge().await {
            BiometricOutcome::Success => {}
            BiometricOutcome::UserCancelled => {
                self.log(LogEvent::new("biometric_cancelled").with_screen("unlock"));
                return Err(Error::BiometricCancelled);
            }
            BiometricOutcome::Failed => {
                self.log(LogEvent::new("biometric_failed").with_screen("unlock"));
                return Err(Error::BiometricFailed);
            }
            BiometricOutcome::Unavailable => {
                self.log(LogEvent::new("biometric_unavailable").with_screen("unlock"));
                return Err(Error::BiometricUnavailable(format!(
                    "{} did not complete the challenge",
                    self.gate.provider()
                )));
            }
        }

        let session = self.exchange(identity, "unlock").await?;
        attempt.finish(session.clone());
        Ok(RestoreOutcome::Restored(session))
    }

    /// Rebuild a session from the stored identity, token and profile,
    /// without a network call. None when the identity or token is missing.
    pub async fn resume(&self) -> Result<Option<Session>> {
        match &*lock(&self.state) {
            SessionState::Authenticated(session) => return Ok(Some(session.clone())),
            SessionState::Authenticating => return Err(Error::Busy),
            SessionState::Unauthenticated => {}
        }

        let (Some(identity), Some(token)) = (self.store.load().await?, self.store.load_token().await?)
        else {
            return Ok(None);
        };

        let profile = self.store.load_profile().await?;
        let session = Session::new(identity, AuthGrant { token, profile });
        let mut state = lock(&self.state);
        // Another attempt may have started while the store was read
        if let SessionState::Authenticated(active) = &*state {
            return Ok(Some(active.clone()));
        }
        if matches!(*state, SessionState::Authenticating) {
            return Err(Error::Busy);
        }
        *state = SessionState::Authenticated(session.clone());
        Ok(Some(session))
    }

    /// End the in-memory session. The credential store is left as is.
    ///
    /// Returns whether a session was active.
    pub fn logout(&self) -> bool {
        let mut state = lock(&self.state);
        if matches!(*state, SessionState::Authenticated(_)) {
            *state = SessionState::Unauthenticated;
            drop(state);
            self.log(LogEvent::new("logout"));
            true
        } else {
            false
        }
    }

    /// `logout` plus removal of the persisted token
    pub async fn sign_out(&self) -> Result<bool> {
        let ended = self.logout();
        self.store.clear_token().await?;
        Ok(ended)
    }

    /// Remove the stored identity, preference and token
    pub async fn forget_credentials(&self) -> Result<()> {
        self.store.clear().await?;
        self.log(LogEvent::new("credentials_forgotten"));
        Ok(())
    }

    pub async fn set_biometric_preference(&self, enabled: bool) -> Result<()> {
        self.store.set_biometric_preference(enabled).await?;
        self.log(LogEvent::new(if enabled {
            "biometric_enabled"
        } else {
            "biometric_disabled"
        }));
        Ok(())
    }

    /// Whether the next launch would attempt biometric unlock
    pub async fn biometric_login_enabled(&self) -> Result<bool> {
        Ok(self.store.biometric_preference().await? && self.store.load().await?.is_some())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state().name())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
