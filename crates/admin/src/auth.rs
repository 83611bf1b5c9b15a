//! Admin sign-in and session verification.
//!
//! Login exchanges credentials for a token; the caller stores it in the
//! session cookie. Verification asks the backend whether the stored token is
//! still accepted. A present cookie is never trusted on its own.

use chrono::{DateTime, Utc};
use hexmart_api::{ApiError, SessionError, SessionStore};
use hexmart_core::Credentials;
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;

use crate::api::AdminApi;

/// Shown when the backend rejects a login without saying why.
pub const UNKNOWN_ERROR: &str = "未知錯誤";

/// Shown after a successful login, before the console appears.
pub const LOGIN_SUCCESS: &str = "登入成功";

/// Errors from the auth flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-in rejected; carries the message to show under the form.
    #[error("Login failed: {0}")]
    InvalidCredentials(String),

    /// No live cookie, or the backend refused the token.
    #[error("Not signed in")]
    Unauthorized,

    /// Verification could not reach a verdict (network, 5xx).
    #[error("Session check failed: {0}")]
    Api(#[source] ApiError),

    /// Another sign-in is still running; this one was not attempted.
    #[error("Login already in progress")]
    InProgress,

    /// The issued token could not be stored.
    #[error("Failed to store session: {0}")]
    Session(#[from] SessionError),
}

/// A token issued by `admin/signin`.
#[derive(Clone)]
pub struct LoginGrant {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl LoginGrant {
    /// Write the token into the session cookie.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the cookie jar cannot be written.
    pub fn persist(&self, session: &SessionStore) -> Result<(), AuthError> {
        session.set(self.token.clone(), self.expires_at)?;
        Ok(())
    }
}

impl std::fmt::Debug for LoginGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGrant")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Inline message under the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMessage {
    Success(String),
    Failure(String),
}

impl LoginMessage {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Exchange credentials for a token.
///
/// # Errors
///
/// Any rejection becomes `AuthError::InvalidCredentials` carrying the
/// backend's message, or [`UNKNOWN_ERROR`] when there is none.
#[instrument(skip(api, credentials), fields(username = %credentials.username))]
pub async fn login<A: AdminApi>(api: &A, credentials: &Credentials) -> Result<LoginGrant, AuthError> {
    let response = match api.signin(credentials).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in rejected");
            return Err(AuthError::InvalidCredentials(
                e.message().unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ));
        }
    };

    let rejected = |messages: &[String]| {
        if messages.is_empty() {
            AuthError::InvalidCredentials(UNKNOWN_ERROR.to_string())
        } else {
            AuthError::InvalidCredentials(messages.join(" "))
        }
    };

    if !response.success {
        return Err(rejected(&response.message));
    }

    let (Some(token), Some(expired)) = (response.token, response.expired) else {
        tracing::warn!("Sign-in succeeded without a token");
        return Err(rejected(&response.message));
    };

    let Some(expires_at) = DateTime::from_timestamp_millis(expired) else {
        tracing::warn!(expired, "Sign-in returned an unusable expiry");
        return Err(AuthError::InvalidCredentials(UNKNOWN_ERROR.to_string()));
    };

    tracing::info!(%expires_at, "Signed in");
    Ok(LoginGrant {
        token: SecretString::from(token),
        expires_at,
    })
}

/// Confirm the stored token with the backend.
///
/// # Errors
///
/// Returns `AuthError::Unauthorized` for a missing or expired cookie and for
/// 401/403 responses, and `AuthError::Api` for anything else.
#[instrument(skip(api))]
pub async fn verify<A: AdminApi>(api: &A) -> Result<(), AuthError> {
    if !api.session().is_present() {
        tracing::debug!("No live session cookie");
        return Err(AuthError::Unauthorized);
    }

    match api.check().await {
        Ok(()) => Ok(()),
        Err(e) if e.is_unauthorized() => Err(AuthError::Unauthorized),
        Err(e) => Err(AuthError::Api(e)),
    }
}

/// Forget the session locally.
///
/// # Errors
///
/// Returns `AuthError::Session` if the cookie jar cannot be removed.
pub fn logout(session: &SessionStore) -> Result<(), AuthError> {
    session.clear()?;
    tracing::info!("Signed out");
    Ok(())
}
