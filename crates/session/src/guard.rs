//! Role-based route guarding

use crate::state::{SessionSnapshot, SessionStatus};
use tokio::sync::watch;
use trek_core::RoutesConfig;

/// Where the guard sends a navigation it refuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirects {
    pub login_path: String,
    pub home_path: String,
}

impl Default for Redirects {
    fn default() -> Self {
        Self::from(&RoutesConfig::default())
    }
}

impl From<&RoutesConfig> for Redirects {
    fn from(config: &RoutesConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
            home_path: config.home_path.clone(),
        }
    }
}

/// What to do with a navigation to a guarded view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Session restore is still in flight; hold off
    Pending,
    RedirectToLogin(String),
    RedirectToHome(String),
}

impl GuardDecision {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::RedirectToLogin(path) | Self::RedirectToHome(path) => Some(path),
            Self::Render | Self::Pending => None,
        }
    }
}

/// Gate for a subtree of views
///
/// An empty role list admits any authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    required_roles: Vec<String>,
    redirects: Redirects,
}

impl RouteGuard {
    pub fn new<I, S>(required_roles: I, redirects: Redirects) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_roles: required_roles.into_iter().map(Into::into).collect(),
            redirects,
        }
    }

    /// Any authenticated user
    pub fn authenticated(redirects: Redirects) -> Self {
        Self::new(Vec::<String>::new(), redirects)
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn evaluate(&self, session: &SessionSnapshot) -> GuardDecision {
        match (session.status(), session.identity()) {
            (SessionStatus::Restoring, _) => GuardDecision::Pending,
            (SessionStatus::Authenticated, Some(identity)) => {
                if identity.has_any_role(&self.required_roles) {
                    GuardDecision::Render
                } else {
                    GuardDecision::RedirectToHome(self.redirects.home_path.clone())
                }
            }
            _ => GuardDecision::RedirectToLogin(self.redirects.login_path.clone()),
        }
    }

    /// Wait out any pending restore, then decide
    ///
    /// A closed channel means the session owner is gone and is treated as
    /// unauthenticated.
    pub async fn resolve(&self, session: &mut watch::Receiver<SessionSnapshot>) -> GuardDecision {
        match session.wait_for(|s| !s.loading()).await {
            Ok(snapshot) => self.evaluate(&snapshot),
            Err(_) => GuardDecision::RedirectToLogin(self.redirects.login_path.clone()),
        }
    }
}
