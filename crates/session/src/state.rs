//! Session state published to readers

use crate::claims::Identity;
use std::time::Duration;
use trek_core::SessionPolicyConfig;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Unauthenticated,
    /// The startup restore is in flight
    Restoring,
    Authenticated,
}

/// Immutable view of the session
///
/// The token and identity are only ever set together, so
/// `identity().is_some() == access_token().is_some()` always holds.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    credentials: Option<(String, Identity)>,
    status: SessionStatus,
}

impl SessionSnapshot {
    /// Initial state: nothing known yet, restore pending
    pub const fn restoring() -> Self {
        Self {
            credentials: None,
            status: SessionStatus::Restoring,
        }
    }

    pub const fn unauthenticated() -> Self {
        Self {
            credentials: None,
            status: SessionStatus::Unauthenticated,
        }
    }

    pub(crate) const fn authenticated(access_token: String, identity: Identity) -> Self {
        Self {
            credentials: Some((access_token, identity)),
            status: SessionStatus::Authenticated,
        }
    }

    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// True while the startup restore is in flight
    pub fn loading(&self) -> bool {
        self.status == SessionStatus::Restoring
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|(token, _)| token.as_str())
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.credentials.as_ref().map(|(_, identity)| identity)
    }

    /// True when no token is held, whether or not a restore is pending
    pub fn is_empty(&self) -> bool {
        self.credentials.is_none()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::restoring()
    }
}

impl std::fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("status", &self.status)
            .field("identity", &self.identity())
            .field("access_token", &self.access_token().map(|_| "<redacted>"))
            .finish()
    }
}

/// Refresh and idle timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Activity after this much quiet time triggers a silent refresh
    pub refresh_after: Duration,
    /// No activity for this long logs the session out
    pub idle_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from(&SessionPolicyConfig::default())
    }
}

impl From<&SessionPolicyConfig> for SessionPolicy {
    fn from(config: &SessionPolicyConfig) -> Self {
        Self {
            refresh_after: config.refresh_after(),
            idle_timeout: config.idle_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_restoring() {
        let snapshot = SessionSnapshot::default();
        assert!(snapshot.loading());
        assert!(snapshot.is_empty());
        assert!(snapshot.identity().is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let snapshot = SessionSnapshot::authenticated(
            "very-secret".into(),
            Identity {
                subject_id: "u1".into(),
                role: "admin".into(),
            },
        );
        assert!(!format!("{snapshot:?}").contains("very-secret"));
        assert_eq!(snapshot.access_token(), Some("very-secret"));
    }

    #[test]
    fn test_default_policy_values() {
        let policy = SessionPolicy::default();
        assert_eq!(policy.refresh_after, Duration::from_secs(5 * 60));
        assert_eq!(policy.idle_timeout, Duration::from_secs(60 * 60));
    }
}
