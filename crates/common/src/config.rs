//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session token configuration.
    pub auth: AuthConfig,
    /// Media host configuration.
    pub media: MediaConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Request timeout in seconds for the whole router.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign access tokens.
    pub access_token_secret: String,
    /// Secret used to sign refresh tokens.
    pub refresh_token_secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: i64,
}

/// Media host configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Upload endpoint of the media-hosting service.
    pub upload_url: String,
    /// API key presented to the media host.
    pub api_key: String,
    /// Upload timeout in seconds.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
    /// Directory where multipart bodies are staged before upload.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_access_token_expiry() -> i64 {
    // 1 day
    86_400
}

const fn default_refresh_token_expiry() -> i64 {
    // 10 days
    864_000
}

const fn default_upload_timeout() -> u64 {
    120
}

fn default_temp_dir() -> String {
    "./public/temp".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `PLAYTUBE_ENV`)
    /// 3. Environment variables with `PLAYTUBE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("PLAYTUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PLAYTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PLAYTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
