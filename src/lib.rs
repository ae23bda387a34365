//! Pattern Portal - a small OpenID Connect gated pattern generator
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Home page and pattern form                               │
//! │  - Login / callback / logout                                │
//! │  - Health and metrics endpoints                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Auth Layer                              │
//! │  - Signed cookie sessions                                   │
//! │  - IdentityProvider (OpenID Connect discovery client)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Pattern Builder                         │
//! │  - Pure diamond generator                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers and HTML views
//! - `auth`: OpenID Connect login and sessions
//! - `pattern`: Diamond pattern builder
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pattern;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// the configuration, session signer and identity provider.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Signed cookie session reader/writer
    pub sessions: auth::SessionManager,

    /// Identity provider used for login
    pub provider: Arc<dyn auth::IdentityProvider>,
}

impl AppState {
    /// Initialize application state with the OpenID Connect client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let provider = auth::OidcClient::new(config.auth.provider.clone())?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Initialize application state with a custom identity provider
    pub fn with_provider(
        config: config::AppConfig,
        provider: Arc<dyn auth::IdentityProvider>,
    ) -> Self {
        let sessions = auth::SessionManager::from_config(&config);

        Self {
            config: Arc::new(config),
            sessions,
            provider,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::trace::TraceLayer;

    let metrics_routes = Router::<AppState>::new()
        .route("/metrics", axum::routing::get(metrics_export))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::home_router())
        .merge(auth::auth_router())
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Prometheus text exposition of the application counters
async fn metrics_export() -> Result<impl axum::response::IntoResponse, error::AppError> {
    let body = metrics::render().map_err(|e| error::AppError::Internal(e.into()))?;
    Ok(([(axum::http::header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
