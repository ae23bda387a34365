//! OpenID Connect client
//!
//! Implements the authorization code flow (with PKCE) against a provider
//! described by a discovery document.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use super::pkce;
use super::provider::{AuthorizationRequest, IdentityProvider, TokenResponse};
use super::session::{PendingLogin, UserIdentity};
use crate::config::ProviderConfig;
use crate::error::AppError;

/// Subset of the discovery document this client relies on
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default)]
    pub issuer: Option<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoClaims {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// OpenID Connect client for a single provider
pub struct OidcClient {
    config: ProviderConfig,
    http: reqwest::Client,
    metadata: OnceCell<ProviderMetadata>,
}

impl OidcClient {
    pub fn new(config: ProviderConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("PatternPortal/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self::with_http_client(config, http))
    }

    /// Use a custom HTTP client
    pub fn with_http_client(config: ProviderConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            metadata: OnceCell::new(),
        }
    }

    /// Discovery metadata, fetched on first use and cached afterwards
    pub async fn metadata(&self) -> Result<&ProviderMetadata, AppError> {
        self.metadata.get_or_try_init(|| self.discover()).await
    }

    async fn discover(&self) -> Result<ProviderMetadata, AppError> {
        tracing::debug!(url = %self.config.discovery_url, "Fetching OpenID discovery document");

        let response = self.http.get(&self.config.discovery_url).send().await?;
        let response = ensure_success(response, "discovery").await?;
        let metadata: ProviderMetadata = response.json().await?;

        tracing::info!(
            issuer = ?metadata.issuer,
            authorization_endpoint = %metadata.authorization_endpoint,
            "OpenID provider metadata loaded"
        );

        Ok(metadata)
    }

    fn client_id(&self) -> Result<&str, AppError> {
        non_empty(self.config.client_id.as_deref())
            .ok_or_else(|| AppError::Config("OAuth client id is not configured".to_string()))
    }

    fn client_secret(&self) -> Result<&str, AppError> {
        non_empty(self.config.client_secret.as_deref())
            .ok_or_else(|| AppError::Config("OAuth client secret is not configured".to_string()))
    }

    async fn userinfo_endpoint(&self) -> Result<String, AppError> {
        if let Some(url) = non_empty(self.config.userinfo_url.as_deref()) {
            return Ok(url.to_string());
        }

        self.metadata()
            .await?
            .userinfo_endpoint
            .clone()
            .ok_or_else(|| {
                AppError::Config("provider does not advertise a userinfo endpoint".to_string())
            })
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    async fn authorize_redirect(
        &self,
        callback_url: &str,
    ) -> Result<AuthorizationRequest, AppError> {
        let client_id = self.client_id()?;
        let metadata = self.metadata().await?;

        let state = pkce::generate_state();
        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::generate_code_challenge(&code_verifier);

        let mut url = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| AppError::Config(format!("invalid authorization endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", callback_url)
            .append_pair("scope", &self.config.scopes)
            .append_pair("state", &state)
            .append_pair("code_challenge", &code_challenge)
            .append_pair("code_challenge_method", "S256");

        Ok(AuthorizationRequest {
            url: url.into(),
            pending: PendingLogin {
                state,
                code_verifier,
                redirect_uri: callback_url.to_string(),
            },
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        pending: &PendingLogin,
    ) -> Result<TokenResponse, AppError> {
        let client_id = self.client_id()?;
        let client_secret = self.client_secret()?;
        let metadata = self.metadata().await?;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", pending.redirect_uri.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code_verifier", pending.code_verifier.as_str()),
        ];

        let response = self
            .http
            .post(&metadata.token_endpoint)
            .form(&params)
            .send()
            .await?;

        let response = ensure_success(response, "token exchange").await?;
        let token: TokenResponse = response.json().await?;
        tracing::debug!(token_type = ?token.token_type, "Token exchange succeeded");

        Ok(token)
    }

    async fn fetch_profile(&self, token: &TokenResponse) -> Result<UserIdentity, AppError> {
        let endpoint = self.userinfo_endpoint().await?;

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        let response = ensure_success(response, "userinfo request").await?;
        let claims: UserInfoClaims = response.json().await?;

        Ok(UserIdentity {
            name: claims.name.unwrap_or_default(),
            email: claims.email.unwrap_or_default(),
            picture: claims.picture.unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Returns the response on success or a provider error with the body as detail
async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    Err(AppError::Provider {
        operation,
        status,
        detail,
    })
}
