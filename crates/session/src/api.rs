//! The remote auth calls the session manager depends on

use async_trait::async_trait;
use trek_http::types::LoginRequest;
use trek_http::{ClientError, PublicTrekClient};

/// Auth endpoints consumed by [`crate::SessionManager`]
///
/// Every method that mints a session returns the raw access token.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<String, ClientError>;

    /// `POST /auth/oAuth-login`
    async fn oauth_login(&self, id_token: &str) -> Result<String, ClientError>;

    /// `POST /auth/refresh`, authenticated by the refresh cookie
    async fn refresh(&self) -> Result<String, ClientError>;

    /// `POST /auth/logout`, with a bearer header when a token is held
    async fn logout(&self, access_token: Option<String>) -> Result<(), ClientError>;
}

/// [`AuthApi`] backed by the HTTP client
#[derive(Clone, Debug)]
pub struct RemoteAuthApi {
    client: PublicTrekClient,
}

impl RemoteAuthApi {
    pub const fn new(client: PublicTrekClient) -> Self {
        Self { client }
    }

    /// The client whose cookie store carries the refresh credential
    pub const fn client(&self) -> &PublicTrekClient {
        &self.client
    }
}

#[async_trait]
impl AuthApi for RemoteAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<String, ClientError> {
        self.client
            .login(&request.username, &request.password)
            .await
            .map(|t| t.access_token)
    }

    async fn oauth_login(&self, id_token: &str) -> Result<String, ClientError> {
        self.client
            .oauth_login(id_token)
            .await
            .map(|t| t.access_token)
    }

    async fn refresh(&self) -> Result<String, ClientError> {
        self.client.refresh().await.map(|t| t.access_token)
    }

    async fn logout(&self, access_token: Option<String>) -> Result<(), ClientError> {
        match access_token {
            Some(token) => self.client.authenticate(token).logout().await,
            None => self.client.logout().await,
        }
    }
}
