//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HEXMART_API_BASE_URL` - Backend origin (e.g. `https://api.example.com/v2`)
//! - `HEXMART_API_PATH` - Per-shop path segment inserted after `/api/`
//!
//! ## Optional
//! - `HEXMART_COOKIE_NAME` - Name of the session cookie (default: `hexToken`)
//! - `HEXMART_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `HEXMART_SESSION_FILE` - Where the session cookie is kept between runs
//!   (default: `.hexmart-session.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_COOKIE_NAME: &str = "hexToken";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_FILE: &str = ".hexmart-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where and how to reach the backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; endpoints resolve to `{base_url}/api/{api_path}/…`
    pub base_url: Url,
    /// Shop path segment
    pub api_path: String,
    /// Session cookie name
    pub cookie_name: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Cookie jar file
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let base_url = required("HEXMART_API_BASE_URL")?;
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            ConfigError::InvalidEnvVar("HEXMART_API_BASE_URL".to_string(), e.to_string())
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "HEXMART_API_BASE_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let api_path = required("HEXMART_API_PATH")?.trim_matches('/').to_string();
        if api_path.contains('/') {
            return Err(ConfigError::InvalidEnvVar(
                "HEXMART_API_PATH".to_string(),
                "must be a single path segment".to_string(),
            ));
        }

        let cookie_name =
            lookup("HEXMART_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

        let timeout_secs = match lookup("HEXMART_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("HEXMART_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let session_file = lookup("HEXMART_SESSION_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Ok(Self {
            base_url,
            api_path,
            cookie_name,
            timeout: Duration::from_secs(timeout_secs),
            session_file,
        })
    }

    /// Config pointing at `base_url` with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` does not parse.
    pub fn for_base_url(base_url: &str, api_path: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.to_string();
        let api_path = api_path.to_string();
        Self::from_lookup(move |key| match key {
            "HEXMART_API_BASE_URL" => Some(base_url.clone()),
            "HEXMART_API_PATH" => Some(api_path.clone()),
            _ => None,
        })
    }
}
