//! Type-safe API clients that enforce authentication requirements at compile time

use super::ClientError;
use crate::types::MessageResponse;
use reqwest::{Client, ClientBuilder, header};
use std::borrow::Cow;
use serde::de::DeserializeOwned;
use std::time::Duration;
use trek_core::ApiConfig;

const DEFAULT_USER_AGENT: &str = concat!("trek-client/", env!("CARGO_PKG_VERSION"));

/// Client for public endpoints that don't require authentication
///
/// The underlying HTTP client keeps a cookie store, so the refresh cookie set
/// by `/auth/login` is sent back on `/auth/refresh` and `/auth/logout`.
#[derive(Clone)]
pub struct PublicTrekClient {
    client: Client,
    base_url: String,
}

/// Client for endpoints that require a bearer access token
#[derive(Clone)]
pub struct AuthenticatedTrekClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for AuthenticatedTrekClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedTrekClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for PublicTrekClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicTrekClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn build_http_client(
    timeout: Option<Duration>,
    user_agent: Option<String>,
) -> Result<Client, ClientError> {
    let mut builder = ClientBuilder::new()
        .cookie_store(true)
        .user_agent(user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Send a request and decode a JSON body, mapping error statuses to `ClientError`
pub(crate) async fn execute_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    } else {
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        tracing::debug!(status = status.as_u16(), "request rejected");
        Err(ClientError::from_status(status, message))
    }
}

/// Send a request answered by an optional `{message}` acknowledgement
///
/// Success is decided by the status alone; an empty or non-JSON body decodes
/// as an empty message.
pub(crate) async fn execute_message(
    request: reqwest::RequestBuilder,
) -> Result<MessageResponse, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    } else {
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        tracing::debug!(status = status.as_u16(), "request rejected");
        Err(ClientError::from_status(status, message))
    }
}

/// Percent-encode a value for use as a single path segment
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Send a request whose response body is irrelevant
pub(crate) async fn execute_empty(request: reqwest::RequestBuilder) -> Result<(), ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        Ok(())
    } else {
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        tracing::debug!(status = status.as_u16(), "request rejected");
        Err(ClientError::from_status(status, message))
    }
}

impl PublicTrekClient {
    /// Create a new public client
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        TypedClientBuilder::new().base_url(base_url).build_public()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder without authentication
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        execute_json(request).await
    }

    /// Attach an access token, sharing this client's connection pool and cookie store
    pub fn authenticate(&self, access_token: impl Into<String>) -> AuthenticatedTrekClient {
        AuthenticatedTrekClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            access_token: access_token.into(),
        }
    }
}

impl AuthenticatedTrekClient {
    /// Create a new authenticated client
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        TypedClientBuilder::new()
            .base_url(base_url)
            .build_authenticated(access_token)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token attached to every request
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Create a request builder with authentication
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.access_token))
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        execute_json(request).await
    }

    /// Create a public client (useful for calling public endpoints)
    pub fn to_public(&self) -> PublicTrekClient {
        PublicTrekClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

/// Type-safe builder that creates the appropriate client type
#[derive(Debug, Default)]
pub struct TypedClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl TypedClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `[api]` configuration section
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new()
            .base_url(&config.base_url)
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    fn into_parts(self) -> Result<(Client, String), ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let client = build_http_client(self.timeout, self.user_agent)?;
        Ok((client, base_url))
    }

    /// Build a public client
    pub fn build_public(self) -> Result<PublicTrekClient, ClientError> {
        let (client, base_url) = self.into_parts()?;
        Ok(PublicTrekClient { client, base_url })
    }

    /// Build an authenticated client
    pub fn build_authenticated(
        self,
        access_token: impl Into<String>,
    ) -> Result<AuthenticatedTrekClient, ClientError> {
        let (client, base_url) = self.into_parts()?;
        Ok(AuthenticatedTrekClient {
            client,
            base_url,
            access_token: access_token.into(),
        })
    }
}
