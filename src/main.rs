//! Pattern Portal binary entry point

use pattern_portal::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load .env
/// 2. Load configuration from file and environment
/// 3. Initialize tracing/logging from `[logging]`
/// 4. Validate configuration
/// 5. Initialize AppState
/// 6. Build Axum router
/// 7. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load .env if present
    dotenv::dotenv().ok();

    // 2. Load configuration
    let config = config::AppConfig::load()?;

    // 3. Initialize tracing/logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter_directive().into());

    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting Pattern Portal...");

    // 4. Validate configuration
    config.validate()?;
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        discovery_url = %config.auth.provider.discovery_url,
        "Configuration loaded"
    );

    pattern_portal::metrics::init_metrics();

    // 5. Initialize application state
    let state = AppState::new(config.clone())?;

    // 6. Build Axum router
    let app = pattern_portal::build_router(state);

    // 7. Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Public URL: {}", config.server.base_url());
    tracing::info!("OAuth callback URL: {}", config.server.callback_url());

    axum::serve(listener, app).await?;

    Ok(())
}
