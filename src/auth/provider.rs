//! Identity provider capability
//!
//! The login routes only talk to the provider through [`IdentityProvider`],
//! so they can be exercised without network access.

use async_trait::async_trait;
use serde::Deserialize;

use super::session::{PendingLogin, UserIdentity};
use crate::error::AppError;

/// Where to send the browser, plus the values to remember until the callback
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub pending: PendingLogin,
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Authorization-code flow against an external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Build the authorization redirect for `callback_url`
    async fn authorize_redirect(&self, callback_url: &str)
    -> Result<AuthorizationRequest, AppError>;

    /// Exchange the provider-issued code for a token
    async fn exchange_code(
        &self,
        code: &str,
        pending: &PendingLogin,
    ) -> Result<TokenResponse, AppError>;

    /// Fetch the user's profile with an access token
    async fn fetch_profile(&self, token: &TokenResponse) -> Result<UserIdentity, AppError>;
}
