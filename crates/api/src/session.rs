//! Session cookie storage.
//!
//! The backend issues an opaque token with an expiry timestamp. The token is
//! kept as a named cookie; presence says nothing about validity, which only
//! the backend's `admin/check` can confirm. A store may be backed by a file so
//! the CLI keeps its session between invocations.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when persisting the session cookie.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session file is malformed: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Session expiry out of range: {0}")]
    InvalidExpiry(i64),
}

/// A named token cookie with its expiry.
#[derive(Clone)]
pub struct SessionCookie {
    name: String,
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl SessionCookie {
    #[must_use]
    pub fn new(name: impl Into<String>, token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            token,
            expires_at,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the cookie has lapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// On-disk cookie jar entry. `expires` is unix milliseconds, as issued.
#[derive(Serialize, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    expires: i64,
}

/// Shared holder for the session cookie.
///
/// Cloning yields another handle to the same cookie.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    name: String,
    path: Option<PathBuf>,
    cookie: RwLock<Option<SessionCookie>>,
    /// Bumped on every set/clear so observers can tell tokens apart.
    version: AtomicU64,
}

impl SessionStore {
    /// A store that lives only as long as the process.
    #[must_use]
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::with_parts(name.into(), None, None)
    }

    /// A store backed by a cookie jar file.
    ///
    /// A missing file starts an empty session. A cookie with another name, an
    /// expired cookie or an unreadable jar is ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the file exists but cannot be read.
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let name = name.into();
        let path = path.into();
        let cookie = load_cookie(&name, &path)?;
        Ok(Self::with_parts(name, Some(path), cookie))
    }

    fn with_parts(name: String, path: Option<PathBuf>, cookie: Option<SessionCookie>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                name,
                path,
                cookie: RwLock::new(cookie),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Cookie name this store reads and writes.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.inner.name
    }

    /// Store a freshly issued token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the cookie jar cannot be written. The
    /// in-memory cookie is updated regardless.
    pub fn set(&self, token: SecretString, expires_at: DateTime<Utc>) -> Result<(), SessionError> {
        let cookie = SessionCookie::new(self.inner.name.clone(), token, expires_at);
        let stored = StoredCookie {
            name: cookie.name.clone(),
            value: cookie.token.expose_secret().to_string(),
            expires: expires_at.timestamp_millis(),
        };

        *self
            .inner
            .cookie
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(cookie);
        self.inner.version.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(cookie = %self.inner.name, %expires_at, "Session cookie set");

        if let Some(path) = &self.inner.path {
            fs::write(path, serde_json::to_vec_pretty(&stored)?)?;
        }
        Ok(())
    }

    /// Store a token whose expiry is given in unix milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidExpiry` for an unrepresentable timestamp,
    /// or a write error from [`SessionStore::set`].
    pub fn set_with_millis(&self, token: SecretString, expires_ms: i64) -> Result<(), SessionError> {
        let expires_at =
            DateTime::from_timestamp_millis(expires_ms).ok_or(SessionError::InvalidExpiry(expires_ms))?;
        self.set(token, expires_at)
    }

    /// The current cookie, if one exists and has not expired.
    #[must_use]
    pub fn current(&self) -> Option<SessionCookie> {
        let guard = self
            .inner
            .cookie
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|cookie| !cookie.is_expired_at(Utc::now()))
            .cloned()
    }

    /// The live token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.current().map(|cookie| cookie.token)
    }

    /// Whether a live cookie exists.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.current().is_some()
    }

    /// Counter that changes whenever the cookie is set or cleared.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Drop the cookie locally and remove the jar file.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the jar exists but cannot be removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        *self
            .inner
            .cookie
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.version.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(cookie = %self.inner.name, "Session cookie cleared");

        if let Some(path) = &self.inner.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("name", &self.inner.name)
            .field("path", &self.inner.path)
            .field("present", &self.is_present())
            .finish_non_exhaustive()
    }
}

fn load_cookie(name: &str, path: &Path) -> Result<Option<SessionCookie>, SessionError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let stored: StoredCookie = match serde_json::from_slice(&raw) {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
            return Ok(None);
        }
    };

    if stored.name != name {
        tracing::debug!(found = %stored.name, expected = %name, "Ignoring cookie with another name");
        return Ok(None);
    }

    let Some(expires_at) = DateTime::from_timestamp_millis(stored.expires) else {
        tracing::warn!(expires = stored.expires, "Ignoring cookie with invalid expiry");
        return Ok(None);
    };

    let cookie = SessionCookie::new(stored.name, SecretString::from(stored.value), expires_at);
    if cookie.is_expired_at(Utc::now()) {
        tracing::debug!(%expires_at, "Ignoring expired session cookie");
        return Ok(None);
    }
    Ok(Some(cookie))
}
