//! Authentication endpoints

use super::ClientError;
use super::typed::{AuthenticatedTrekClient, PublicTrekClient, execute_empty, execute_message};
use crate::types::{
    ForgotPasswordRequest, LoginRequest, MessageResponse, OAuthLoginRequest, RegisterRequest,
    TokenResponse,
};
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

/// Authentication endpoints for public client
impl PublicTrekClient {
    /// Exchange username and password for an access token
    #[instrument(name = "auth_login", skip_all)]
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<TokenResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/login").json(&LoginRequest {
            username: username.into(),
            password: password.into(),
        });
        self.execute(req).await
    }

    /// Create an account; the user logs in separately afterwards
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<MessageResponse, ClientError> {
        let req = self.request(Method::POST, "/users/register").json(request);
        execute_message(req).await
    }

    /// Ask the API to send a password reset link
    pub async fn forgot_password(
        &self,
        username: impl Into<String>,
    ) -> Result<MessageResponse, ClientError> {
        let req = self
            .request(Method::POST, "/users/forgot-password")
            .json(&ForgotPasswordRequest {
                username: username.into(),
            });
        execute_message(req).await
    }

    /// Exchange an identity-provider ID token for an access token
    #[instrument(name = "auth_oauth_login", skip_all)]
    pub async fn oauth_login(
        &self,
        id_token: impl Into<String>,
    ) -> Result<TokenResponse, ClientError> {
        let req = self
            .request(Method::POST, "/auth/oAuth-login")
            .json(&OAuthLoginRequest {
                id_token: id_token.into(),
            });
        self.execute(req).await
    }

    /// Mint a new access token from the refresh cookie
    #[instrument(name = "auth_refresh", skip_all)]
    pub async fn refresh(&self) -> Result<TokenResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/refresh").json(&json!({}));
        self.execute(req).await
    }

    /// Invalidate the server-side session identified by the refresh cookie alone
    #[instrument(name = "auth_logout", skip_all)]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let req = self.request(Method::POST, "/auth/logout").json(&json!({}));
        execute_empty(req).await
    }
}

/// Authentication endpoints for authenticated client
impl AuthenticatedTrekClient {
    /// Invalidate the server-side session for this token and the refresh cookie
    #[instrument(name = "auth_logout", skip_all)]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let req = self.request(Method::POST, "/auth/logout").json(&json!({}));
        execute_empty(req).await
    }
}
