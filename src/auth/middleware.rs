//! Authentication middleware
//!
//! Loads the signed session for each request and protects routes that
//! require a signed-in user.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::session::Session;
use crate::AppState;
use crate::error::AppError;

/// Session of the current request
///
/// Never rejects: a missing or invalid cookie yields an empty session.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(CurrentSession(session));
        }

        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let session = app_state.sessions.load(&jar);
        parts.extensions.insert(session.clone());

        Ok(CurrentSession(session))
    }
}

/// Middleware to require a signed-in user
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/metrics", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_user));
/// ```
pub async fn require_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = state.sessions.load(&jar);
    if session.user.is_none() {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
