//! Adapter configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use crate::services::rate_limit::RateLimit;
use std::env;
use std::time::Duration;

/// Default Dailymile API root.
pub const DEFAULT_API_BASE: &str = "https://api.dailymile.com";

/// Adapter configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dailymile OAuth client ID (public)
    pub client_id: String,
    /// Dailymile OAuth client secret
    pub client_secret: String,
    /// Public root of the web front-end, used to build the OAuth redirect URI
    pub web_root: String,
    /// Dailymile API root (overridable for tests)
    pub api_base_url: String,
    /// Global request quota shared by every account
    pub rate_limits: Vec<RateLimit>,
    /// Minimum gap between two uploads by one adapter instance
    pub upload_cooldown: Duration,
    /// First wait before attaching a track file
    pub track_upload_initial_backoff: Duration,
    /// GCP project for the Firestore cache store; in-memory cache when unset
    pub gcp_project_id: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            client_id: "test_client_id".to_string(),
            client_secret: "test_secret".to_string(),
            web_root: "http://localhost:8000".to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            rate_limits: vec![RateLimit::new(100, Duration::from_secs(3600))],
            upload_cooldown: Duration::from_secs(5),
            track_upload_initial_backoff: Duration::from_secs(1),
            gcp_project_id: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let rate_limits = match env::var("DAILYMILE_RATE_LIMITS") {
            Ok(raw) => RateLimit::parse_list(&raw)
                .map_err(|e| ConfigError::Invalid("DAILYMILE_RATE_LIMITS", e))?,
            Err(_) => vec![RateLimit::new(100, Duration::from_secs(3600))],
        };

        let upload_cooldown = match env::var("DAILYMILE_UPLOAD_COOLDOWN_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid("DAILYMILE_UPLOAD_COOLDOWN_SECS", format!("{e}")))?,
            Err(_) => Duration::from_secs(5),
        };

        Ok(Self {
            client_id: env::var("DAILYMILE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("DAILYMILE_CLIENT_ID"))?,
            client_secret: env::var("DAILYMILE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("DAILYMILE_CLIENT_SECRET"))?,
            web_root: env::var("WEB_ROOT").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            api_base_url: env::var("DAILYMILE_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            rate_limits,
            upload_cooldown,
            track_upload_initial_backoff: Duration::from_secs(1),
            gcp_project_id: env::var("GCP_PROJECT_ID").ok().filter(|v| !v.is_empty()),
        })
    }

    /// OAuth redirect target registered with Dailymile.
    pub fn redirect_uri(&self) -> String {
        format!(
            "{}/auth/return/dailymile",
            self.web_root.trim_end_matches('/')
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
