//! Trek client session
//!
//! [`SessionManager`] owns the access token and decoded identity, restores the
//! session once on activation, refreshes it on activity after a quiet period,
//! and logs out after a long idle stretch. [`RouteGuard`] and [`RouteTable`]
//! decide what a navigation should do given the current session.

pub mod activity;
pub mod api;
pub mod claims;
pub mod error;
pub mod guard;
pub mod manager;
pub mod routes;
pub mod state;

pub use activity::{Activation, ActivitySender, ActivitySignal};
pub use api::{AuthApi, RemoteAuthApi};
pub use claims::{Identity, TokenError, decode_identity};
pub use error::{Result, SessionError};
pub use guard::{GuardDecision, Redirects, RouteGuard};
pub use manager::{RefreshOutcome, RestoreOutcome, SessionManager};
pub use routes::{Access, Navigation, Route, RouteTable};
pub use state::{SessionPolicy, SessionSnapshot, SessionStatus};
