//! Trek API client
//!
//! Two client types split the API surface: [`PublicTrekClient`] for endpoints
//! that need no credentials and [`AuthenticatedTrekClient`] for endpoints that
//! need a bearer token. Both share one connection pool and cookie store.

pub mod auth;
pub mod content;
pub mod error;
pub mod orders;
pub mod typed;

pub use error::ClientError;
pub use typed::{AuthenticatedTrekClient, PublicTrekClient, TypedClientBuilder};
