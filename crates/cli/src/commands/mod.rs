//! Subcommand implementations.
//!
//! Each command builds the same controllers a UI would, drives one
//! operation, and reports the outcome through `tracing`.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod products;

use std::path::PathBuf;

use hexmart_admin::{AuthError, FormError};
use hexmart_api::{ApiClient, ApiError, ClientConfig, ConfigError, SessionError, SessionStore};
use hexmart_core::EmailError;
use thiserror::Error;

/// Errors surfaced to `main`, which logs them and exits non-zero.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session file error: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid product input: {0}")]
    Form(#[from] FormError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not signed in, run `hexmart login` first")]
    NotSignedIn,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Cart line not found: {0}")]
    CartLineNotFound(String),

    /// The backend refused the action; carries the toast text.
    #[error("{0}")]
    Rejected(String),
}

/// Build an API client from the environment, with the session cookie
/// persisted in `HEXMART_SESSION_FILE`.
pub fn connect() -> Result<ApiClient, CliError> {
    let config = ClientConfig::from_env()?;
    let session = SessionStore::open(config.cookie_name.clone(), config.session_file.clone())?;
    tracing::debug!(base_url = %config.base_url, "Connecting");
    Ok(ApiClient::new(&config, session)?)
}

/// The current toast text, or `fallback` when nothing was shown.
pub fn toast_text(toasts: &hexmart_core::ui::ToastController, fallback: &str) -> String {
    toasts
        .current()
        .map_or_else(|| fallback.to_string(), |toast| toast.message)
}
