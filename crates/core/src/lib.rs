//! Trek core types and utilities

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ApiConfig, LoggingConfig, RoutesConfig, SessionPolicyConfig, TrekConfig};
pub use error::{CoreError, CoreResult};
