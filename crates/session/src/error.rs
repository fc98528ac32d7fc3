//! Session error types

use crate::claims::TokenError;
use thiserror::Error;
use trek_http::ClientError;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The token handed to `login` could not be decoded
    #[error("Invalid access token: {0}")]
    Decode(#[from] TokenError),

    /// The remote auth call failed
    #[error(transparent)]
    Api(#[from] ClientError),
}

impl SessionError {
    /// Message for an inline form notification
    pub fn user_message(&self) -> &str {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Decode(_) => trek_http::client::error::GENERIC_FAILURE_MESSAGE,
        }
    }
}
