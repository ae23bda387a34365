//! OpenID Connect authentication
//!
//! Handles:
//! - Authorization code flow with the identity provider
//! - Signed cookie sessions
//! - Authentication middleware

mod middleware;
mod oauth;
pub mod oidc;
mod pkce;
pub mod provider;
pub mod session;

pub use middleware::{CurrentSession, require_user};
pub use oauth::auth_router;
pub use oidc::OidcClient;
pub use provider::{AuthorizationRequest, IdentityProvider, TokenResponse};
pub use session::{PendingLogin, Session, SessionManager, UserIdentity};
