//! Session manager: token lifecycle, restore and refresh

use crate::activity::{self, Activation};
use crate::api::{AuthApi, RemoteAuthApi};
use crate::claims::{Identity, decode_identity};
use crate::error::Result;
use crate::state::{SessionPolicy, SessionSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use trek_core::TrekConfig;
use trek_http::types::LoginRequest;
use trek_http::{ClientError, TypedClientBuilder};

/// Result of [`SessionManager::refresh_token`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token was issued and stored
    Refreshed(Identity),
    /// Another refresh was running; nothing was sent
    AlreadyInFlight,
    /// The refresh failed and the session was cleared
    LoggedOut,
}

/// Result of [`SessionManager::restore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored(Identity),
    /// No refresh credential was accepted; the session is unauthenticated
    NoSession,
    /// The restore already ran (or is running) for this manager
    AlreadyAttempted,
    /// An activity-driven refresh was already running when restore started
    InFlight,
}

/// Owns the current session and keeps it fresh
///
/// Cloning is cheap and every clone drives the same session. Readers that
/// only need state should hold a [`watch::Receiver`] from
/// [`SessionManager::subscribe`].
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    policy: SessionPolicy,
    state: watch::Sender<SessionSnapshot>,
    refresh_in_flight: AtomicBool,
    has_attempted_restore: AtomicBool,
}

/// Clears the in-flight flag however the refresh ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionManager {
    /// Create a manager in the `Restoring` state
    pub fn new(api: Arc<dyn AuthApi>, policy: SessionPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                policy,
                state: watch::Sender::new(SessionSnapshot::restoring()),
                refresh_in_flight: AtomicBool::new(false),
                has_attempted_restore: AtomicBool::new(false),
            }),
        }
    }

    /// Build a manager talking to the API named in `config`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the HTTP client cannot be built
    pub fn from_config(config: &TrekConfig) -> std::result::Result<Self, ClientError> {
        let client = TypedClientBuilder::from_config(&config.api).build_public()?;
        Ok(Self::new(
            Arc::new(RemoteAuthApi::new(client)),
            SessionPolicy::from(&config.session),
        ))
    }

    pub fn policy(&self) -> SessionPolicy {
        self.inner.policy
    }

    /// Current state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// A receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Store a freshly issued access token
    ///
    /// # Errors
    ///
    /// Returns [`crate::SessionError::Decode`] if the token does not carry a
    /// usable `sub` and `role`; the current session is left as it was
    pub fn login(&self, access_token: impl Into<String>) -> Result<Identity> {
        let access_token = access_token.into();
        let identity = decode_identity(&access_token)?;

        info!(
            subject = %identity.subject_id,
            role = %identity.role,
            "Session established"
        );
        self.inner
            .state
            .send_replace(SessionSnapshot::authenticated(access_token, identity.clone()));
        Ok(identity)
    }

    /// Sign in with a username and password
    ///
    /// # Errors
    ///
    /// Returns [`crate::SessionError::Api`] if the API rejects the credentials
    pub async fn sign_in(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Identity> {
        let request = LoginRequest {
            username: username.into(),
            password: password.into(),
        };
        let token = self.inner.api.login(&request).await?;
        self.login(token)
    }

    /// Sign in with an identity-provider ID token
    ///
    /// # Errors
    ///
    /// Returns [`crate::SessionError::Api`] if the API rejects the ID token
    pub async fn sign_in_with_oauth(&self, id_token: &str) -> Result<Identity> {
        let token = self.inner.api.oauth_login(id_token).await?;
        self.login(token)
    }

    /// End the session
    ///
    /// The remote call is best effort. Local state is always cleared.
    pub async fn logout(&self) {
        let access_token = self.inner.state.borrow().access_token().map(str::to_owned);

        if let Err(e) = self.inner.api.logout(access_token).await {
            warn!(error = %e, "Remote logout failed, clearing local session anyway");
        }

        self.inner.state.send_replace(SessionSnapshot::unauthenticated());
        info!("Session cleared");
    }

    /// Exchange the refresh cookie for a new access token
    ///
    /// Any failure, including an undecodable token, logs the session out.
    pub async fn refresh_token(&self) -> RefreshOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.inner.refresh_in_flight) else {
            debug!("Refresh already in flight");
            return RefreshOutcome::AlreadyInFlight;
        };

        let failure = match self.inner.api.refresh().await {
            Ok(token) => match self.login(token) {
                Ok(identity) => {
                    debug!("Access token refreshed");
                    return RefreshOutcome::Refreshed(identity);
                }
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };

        warn!(error = %failure, "Token refresh failed, logging out");
        self.logout().await;
        RefreshOutcome::LoggedOut
    }

    /// Attempt the startup restore once per manager
    pub async fn restore(&self) -> RestoreOutcome {
        if self.inner.has_attempted_restore.swap(true, Ordering::AcqRel) {
            return RestoreOutcome::AlreadyAttempted;
        }

        debug!("Restoring session from refresh cookie");
        match self.refresh_token().await {
            RefreshOutcome::Refreshed(identity) => RestoreOutcome::Restored(identity),
            RefreshOutcome::LoggedOut => RestoreOutcome::NoSession,
            // The running refresh publishes the settled state
            RefreshOutcome::AlreadyInFlight => RestoreOutcome::InFlight,
        }
    }

    pub fn has_attempted_restore(&self) -> bool {
        self.inner.has_attempted_restore.load(Ordering::Acquire)
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.inner.refresh_in_flight.load(Ordering::Acquire)
    }

    /// Install the activity listener and idle timer, restoring the session
    /// first if nothing has populated it yet
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle removes the listener and timer.
    pub fn activate(&self) -> Activation {
        if self.inner.state.borrow().loading() {
            let manager = self.clone();
            tokio::spawn(async move {
                manager.restore().await;
            });
        } else {
            // Signed in before activation; nothing left to restore
            self.inner
                .has_attempted_restore
                .store(true, Ordering::Release);
        }
        activity::spawn_listener(self.clone())
    }

    /// Kick off a background refresh unless one is already running
    pub(crate) fn spawn_refresh(&self) {
        if self.refresh_in_flight() {
            debug!("Activity refresh skipped, refresh in flight");
            return;
        }
        let manager = self.clone();
        tokio::spawn(async move {
            manager.refresh_token().await;
        });
    }

    /// Idle deadline reached with no activity
    pub(crate) fn spawn_idle_logout(&self) {
        if self.inner.state.borrow().is_empty() {
            debug!("Idle timeout with no session held");
            return;
        }
        info!(
            idle_secs = self.inner.policy.idle_timeout.as_secs(),
            "Idle timeout reached, logging out"
        );
        let manager = self.clone();
        tokio::spawn(async move {
            manager.logout().await;
        });
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("policy", &self.inner.policy)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
