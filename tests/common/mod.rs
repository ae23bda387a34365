//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod fake_idp;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pattern_portal::auth::{
    AuthorizationRequest, IdentityProvider, PendingLogin, Session, TokenResponse, UserIdentity,
};
use pattern_portal::error::AppError;
use pattern_portal::{AppState, config};
use tokio::net::TcpListener;

pub const STUB_STATE: &str = "stub-state";
pub const STUB_AUTHORIZE_URL: &str = "https://idp.test/authorize";
pub const STUB_ACCESS_TOKEN: &str = "stub-access-token";

/// Scripted identity provider
///
/// Accepts the code `good-code` and rejects everything else. The code
/// `revoked-code` is exchanged for a token the userinfo endpoint refuses.
pub struct StubProvider {
    pub profile: UserIdentity,
    pub exchanged_codes: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            profile: test_user(),
            exchanged_codes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn authorize_redirect(
        &self,
        callback_url: &str,
    ) -> Result<AuthorizationRequest, AppError> {
        Ok(AuthorizationRequest {
            url: format!(
                "{STUB_AUTHORIZE_URL}?state={STUB_STATE}&redirect_uri={}",
                urlencode(callback_url)
            ),
            pending: PendingLogin {
                state: STUB_STATE.to_string(),
                code_verifier: "stub-verifier".to_string(),
                redirect_uri: callback_url.to_string(),
            },
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        _pending: &PendingLogin,
    ) -> Result<TokenResponse, AppError> {
        self.exchanged_codes.lock().unwrap().push(code.to_string());

        let access_token = match code {
            "good-code" => STUB_ACCESS_TOKEN,
            "revoked-code" => "revoked-access-token",
            _ => {
                return Err(AppError::Provider {
                    operation: "token exchange",
                    status: 400,
                    detail: "invalid_grant".to_string(),
                });
            }
        };

        Ok(serde_json::from_value(serde_json::json!({
            "access_token": access_token,
            "token_type": "Bearer"
        }))
        .unwrap())
    }

    async fn fetch_profile(&self, token: &TokenResponse) -> Result<UserIdentity, AppError> {
        if token.access_token != STUB_ACCESS_TOKEN {
            return Err(AppError::Provider {
                operation: "userinfo request",
                status: 401,
                detail: "invalid_token".to_string(),
            });
        }
        Ok(self.profile.clone())
    }
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn test_user() -> UserIdentity {
    UserIdentity {
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        picture: "https://example.com/avatar.png".to_string(),
    }
}

/// Test configuration bound to `domain`
pub fn test_config(domain: &str, discovery_url: &str) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            domain: domain.to_string(),
            protocol: "http".to_string(),
        },
        auth: config::AuthConfig {
            session_secret: Some("test-secret-key-32-bytes-long!!!".to_string()),
            session_max_age: 3600,
            provider: config::ProviderConfig {
                client_id: Some("test-client-id".to_string()),
                client_secret: Some("test-client-secret".to_string()),
                discovery_url: discovery_url.to_string(),
                userinfo_url: None,
                scopes: "openid email profile".to_string(),
            },
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    /// Client that does not follow redirects
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a test server backed by [`StubProvider`]
    pub async fn new() -> Self {
        Self::start(|config| {
            AppState::with_provider(config, Arc::new(StubProvider::new()))
        })
        .await
    }

    /// Create a test server using the real OpenID Connect client
    pub async fn with_discovery(discovery_url: &str) -> Self {
        let discovery_url = discovery_url.to_string();
        Self::start(move |mut config| {
            config.auth.provider.discovery_url = discovery_url;
            AppState::new(config).unwrap()
        })
        .await
    }

    async fn start(build_state: impl FnOnce(config::AppConfig) -> AppState) -> Self {
        pattern_portal::metrics::init_metrics();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = test_config(&addr.to_string(), pattern_portal::config::DEFAULT_DISCOVERY_URL);
        let state = build_state(config);

        // Build router
        let app = pattern_portal::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            addr: format!("http://{}", addr),
            state,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Cookie header value for a signed-in session
    pub fn signed_in_cookie(&self) -> String {
        self.cookie_for(&Session {
            user: Some(test_user()),
            pending_login: None,
        })
    }

    /// Cookie header value carrying `session`
    pub fn cookie_for(&self, session: &Session) -> String {
        let token = self.state.sessions.encode(session).unwrap();
        format!("session={token}")
    }

    /// GET `/` with `cookie` and return the page
    pub async fn home_page(&self, cookie: &str) -> String {
        self.client
            .get(self.url("/"))
            .header("Cookie", cookie)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    /// POST the pattern form as a signed-in user and return the page
    pub async fn submit_lines(&self, lines: &str) -> String {
        let response = self
            .client
            .post(self.url("/"))
            .header("Cookie", self.signed_in_cookie())
            .form(&[("lines", lines)])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        response.text().await.unwrap()
    }
}

/// `name=value` of the session cookie set by a response, if any
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with("session="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
        .next()
}

/// Location header of a redirect response
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}
