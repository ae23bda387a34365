//! OpenID Connect login flow
//!
//! Implements the OAuth 2.0 authorization code flow with the configured
//! identity provider.

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use thiserror::Error;

use super::middleware::CurrentSession;
use super::session::{PendingLogin, SESSION_COOKIE_NAME, UserIdentity};
use crate::AppState;
use crate::config::CALLBACK_PATH;
use crate::error::AppError;
use crate::metrics::{LOGINS_TOTAL, LOGOUTS_TOTAL};

/// Create authentication router
///
/// Routes:
/// - GET /login - Redirect to the identity provider
/// - GET /auth/callback - OAuth callback
/// - GET /logout - Logout
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route(CALLBACK_PATH, get(auth_callback))
        .route("/logout", get(logout))
}

// =============================================================================
// Login
// =============================================================================

/// GET /login
///
/// Redirects the browser to the provider's authorization endpoint.
///
/// # Steps
/// 1. Build the authorization URL for this deployment's callback
/// 2. Remember state and PKCE verifier in the session
/// 3. Redirect to the provider
async fn login(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let callback_url = state.config.server.callback_url();
    let request = state.provider.authorize_redirect(&callback_url).await?;

    session.pending_login = Some(request.pending);
    let jar = state.sessions.store(jar, &session)?;

    tracing::info!(callback_url = %callback_url, "Redirecting to identity provider");
    Ok((jar, Redirect::to(&request.url)))
}

// =============================================================================
// Callback
// =============================================================================

/// Query parameters from the provider callback
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Error)]
enum CallbackError {
    #[error("provider returned {error}: {description}")]
    Denied { error: String, description: String },

    #[error("malformed callback query")]
    MalformedQuery,

    #[error("missing authorization code")]
    MissingCode,

    #[error("missing state parameter")]
    MissingState,

    #[error("no login in progress for this session")]
    NoPendingLogin,

    #[error("state mismatch")]
    StateMismatch,

    #[error(transparent)]
    Provider(#[from] AppError),
}

/// GET /auth/callback
///
/// Handles the redirect back from the provider.
///
/// # Steps
/// 1. Verify CSRF state against the pending login
/// 2. Exchange code for a token
/// 3. Fetch the user's profile
/// 4. Store the profile in the session
/// 5. Redirect to home
///
/// Any failure yields a 500 with the reason and leaves `user` untouched.
async fn auth_callback(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
    jar: CookieJar,
    query: Option<Query<CallbackQuery>>,
) -> Response {
    let pending = session.pending_login.take();

    let query = query.map(|Query(query)| query);
    let outcome = match complete_login(&state, pending, query).await {
        Ok(user) => {
            tracing::info!(email = %user.email, "Login successful");
            LOGINS_TOTAL.with_label_values(&["success"]).inc();
            session.user = Some(user);
            Ok(Redirect::to("/"))
        }
        Err(error) => {
            tracing::error!(%error, "Login callback failed");
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            Err(AppError::LoginFailed(error.to_string()))
        }
    };

    match state.sessions.store(jar, &session) {
        Ok(jar) => (jar, outcome).into_response(),
        Err(error) => error.into_response(),
    }
}

async fn complete_login(
    state: &AppState,
    pending: Option<PendingLogin>,
    query: Option<CallbackQuery>,
) -> Result<UserIdentity, CallbackError> {
    let query = query.ok_or(CallbackError::MalformedQuery)?;
    if let Some(error) = query.error {
        return Err(CallbackError::Denied {
            error,
            description: query
                .error_description
                .unwrap_or_else(|| "no description".to_string()),
        });
    }

    let code = query.code.ok_or(CallbackError::MissingCode)?;
    let received_state = query.state.ok_or(CallbackError::MissingState)?;
    let pending = pending.ok_or(CallbackError::NoPendingLogin)?;

    if received_state != pending.state {
        return Err(CallbackError::StateMismatch);
    }

    let token = state.provider.exchange_code(&code, &pending).await?;
    let user = state.provider.fetch_profile(&token).await?;

    Ok(user)
}

// =============================================================================
// Logout
// =============================================================================

/// GET /logout
///
/// Drops the user from the session and redirects home. Safe to repeat.
async fn logout(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if session.user.take().is_some() {
        tracing::info!("User logged out");
    }
    LOGOUTS_TOTAL.inc();

    let jar = if jar.get(SESSION_COOKIE_NAME).is_some() {
        state.sessions.store(jar, &session)?
    } else {
        jar
    };

    Ok((jar, Redirect::to("/")))
}
