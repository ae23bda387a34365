//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::net::IpAddr;

/// Google's OpenID Connect discovery document
pub const DEFAULT_DISCOVERY_URL: &str =
    "https://accounts.google.com/.well-known/openid-configuration";

/// Path of the OAuth callback route
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub host: String,
    /// Port number (e.g., 5000)
    pub port: u16,
    /// Public domain, optionally with port (e.g., "127.0.0.1:5000")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the deployment
    ///
    /// # Returns
    /// Full URL like "https://patterns.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }

    /// Callback URL registered with the identity provider
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.base_url(), CALLBACK_PATH)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session signing key (32+ bytes). A random key is used when unset.
    pub session_secret: Option<String>,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    pub provider: ProviderConfig,
}

/// OpenID Connect provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Discovery document URL
    pub discovery_url: String,
    /// Overrides the discovered userinfo endpoint
    pub userinfo_url: Option<String>,
    /// Space-separated scopes
    pub scopes: String,
}

impl ProviderConfig {
    /// True when both client id and secret are present and non-empty
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.client_id) && present(&self.client_secret)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> String {
        format!("pattern_portal={},tower_http=debug", self.level.trim())
    }

    pub fn is_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (PATTERN_PORTAL__*)
    /// 5. GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET, SESSION_SECRET_KEY
    ///
    /// The result is not validated; call [`AppConfig::validate`] once
    /// logging is initialized so its warnings are recorded.
    ///
    /// # Errors
    /// Returns error if a source cannot be read or deserialized
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let session_secret = std::env::var("SESSION_SECRET_KEY")
            .or_else(|_| std::env::var("FLASK_SECRET_KEY"))
            .ok();

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.domain", "127.0.0.1:5000")?
            .set_default("server.protocol", "http")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("auth.provider.discovery_url", DEFAULT_DISCOVERY_URL)?
            .set_default("auth.provider.scopes", "openid email profile")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (PATTERN_PORTAL__*)
            .add_source(
                Environment::with_prefix("PATTERN_PORTAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.provider.client_id", std::env::var("GOOGLE_CLIENT_ID").ok())?
            .set_override_option(
                "auth.provider.client_secret",
                std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            )?
            .set_override_option("auth.session_secret", session_secret)?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    /// Check invariants and warn about degraded but usable settings
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if !matches!(
            self.logging.format.trim().to_ascii_lowercase().as_str(),
            "pretty" | "json"
        ) {
            return Err(crate::error::AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        match self.auth.session_secret.as_deref() {
            Some(secret) if secret.len() < MIN_SESSION_SECRET_BYTES => {
                return Err(crate::error::AppError::Config(format!(
                    "auth.session_secret must be at least {} bytes",
                    MIN_SESSION_SECRET_BYTES
                )));
            }
            Some(_) => {}
            None => tracing::warn!(
                "auth.session_secret is not set; sessions will not survive a restart"
            ),
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if url::Url::parse(&self.auth.provider.discovery_url).is_err() {
            return Err(crate::error::AppError::Config(
                "auth.provider.discovery_url must be an absolute URL".to_string(),
            ));
        }

        if !self.auth.provider.has_credentials() {
            tracing::warn!(
                "OAuth client id or secret is missing; login will fail until they are configured"
            );
        }

        if !self.should_use_secure_cookies() {
            let host = normalized_server_host(&self.server.domain);
            tracing::warn!(
                host = %host,
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
