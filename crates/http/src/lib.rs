//! Trek HTTP client
//!
//! Typed access to the Teeny Tech Trek REST API: authentication, content
//! (blogs, events, packages, registrations, contacts, newsletter) and checkout.

pub mod client;
pub mod types;

pub use client::{AuthenticatedTrekClient, ClientError, PublicTrekClient, TypedClientBuilder};
