//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use std::sync::Arc;

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;

/// Name of the cookie carrying the signed session
pub const SESSION_COOKIE_NAME: &str = "session";

/// Profile of the signed-in user, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
    /// Avatar URL
    pub picture: String,
}

/// Authorization request in flight between `/login` and the callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    /// CSRF state sent to the provider
    pub state: String,
    /// PKCE code verifier
    pub code_verifier: String,
    /// Redirect URI used for the authorization request
    pub redirect_uri: String,
}

/// Per-browser session data
///
/// `user` is present exactly when a login callback has succeeded and the
/// browser has not logged out since.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_login: Option<PendingLogin>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.pending_login.is_none()
    }
}

#[derive(Serialize, Deserialize)]
struct SessionPayload {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `session` - Session data to encode
/// * `expires_at` - Instant after which the token is rejected
/// * `secret` - HMAC secret key
///
/// # Returns
/// Signed token string
pub fn create_session_token(
    session: &Session,
    expires_at: DateTime<Utc>,
    secret: &[u8],
) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize session to JSON
    let payload = serde_json::to_string(&SessionPayload {
        session: session.clone(),
        expires_at,
    })
    .map_err(|e| AppError::Session(e.to_string()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| AppError::Session(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns `Unauthorized` if the signature is invalid, the token is
/// malformed, or it has expired
pub fn verify_session_token(token: &str, secret: &[u8]) -> Result<Session, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| AppError::Session(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized)?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let payload: SessionPayload =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    // 4. Check if session is expired
    if payload.expires_at < Utc::now() {
        return Err(AppError::Unauthorized);
    }

    Ok(payload.session)
}

/// Reads and writes the signed session cookie
#[derive(Clone)]
pub struct SessionManager {
    secret: Arc<[u8]>,
    max_age: Duration,
    secure: bool,
}

impl SessionManager {
    pub fn new(secret: impl AsRef<[u8]>, max_age_seconds: i64, secure: bool) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
            max_age: Duration::seconds(max_age_seconds),
            secure,
        }
    }

    /// Build from configuration, falling back to a random per-process key
    pub fn from_config(config: &AppConfig) -> Self {
        let secure = config.should_use_secure_cookies();
        match config.auth.session_secret.as_deref() {
            Some(secret) => Self::new(secret, config.auth.session_max_age, secure),
            None => {
                use rand::RngCore;

                let mut secret = [0_u8; 32];
                rand::thread_rng().fill_bytes(&mut secret);
                tracing::warn!("Using an ephemeral session key");
                Self::new(secret, config.auth.session_max_age, secure)
            }
        }
    }

    /// Sign a session with this manager's key and lifetime
    pub fn encode(&self, session: &Session) -> Result<String, AppError> {
        create_session_token(session, Utc::now() + self.max_age, &self.secret)
    }

    /// Read the session from the request cookies
    ///
    /// Missing, tampered or expired cookies yield an empty session.
    pub fn load(&self, jar: &CookieJar) -> Session {
        let Some(cookie) = jar.get(SESSION_COOKIE_NAME) else {
            return Session::default();
        };

        match verify_session_token(cookie.value(), &self.secret) {
            Ok(session) => session,
            Err(_) => {
                tracing::debug!("Discarding invalid session cookie");
                Session::default()
            }
        }
    }

    /// Write `session` back to the cookie jar
    ///
    /// An empty session removes the cookie.
    pub fn store(&self, jar: CookieJar, session: &Session) -> Result<CookieJar, AppError> {
        if session.is_empty() {
            let removal = Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build();
            return Ok(jar.remove(removal));
        }

        let cookie = Cookie::build((SESSION_COOKIE_NAME, self.encode(session)?))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();

        Ok(jar.add(cookie))
    }
}
