//! Sign-in credentials.

use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

use super::email::Email;

/// Username/password pair submitted to the sign-in endpoint.
///
/// The password is only exposed while the request body is serialized.
#[derive(Clone)]
pub struct Credentials {
    /// Account email.
    pub username: Email,
    /// Account password.
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from a parsed email and a password.
    #[must_use]
    pub fn new(username: Email, password: impl Into<String>) -> Self {
        Self {
            username,
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Credentials", 2)?;
        state.serialize_field("username", self.username.as_str())?;
        state.serialize_field("password", self.password.expose_secret())?;
        state.end()
    }
}
