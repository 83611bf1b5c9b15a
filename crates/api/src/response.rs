//! Response shapes shared by every endpoint family.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ApiError, messages_from_value};

/// `{success, message}` acknowledgement returned by mutations.
///
/// A missing `success` reads as `true`; some endpoints acknowledge with a
/// bare message. A `null` or empty body (`204 No Content`) is an
/// acknowledgement with no messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<WireAck>")]
pub struct ActionResponse {
    pub success: bool,
    pub message: Vec<String>,
}

#[derive(Deserialize)]
struct WireAck {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default, deserialize_with = "message_list")]
    message: Vec<String>,
}

impl From<Option<WireAck>> for ActionResponse {
    fn from(wire: Option<WireAck>) -> Self {
        wire.map_or_else(Self::default, |ack| Self {
            success: ack.success,
            message: ack.message,
        })
    }
}

impl Default for ActionResponse {
    fn default() -> Self {
        Self {
            success: true,
            message: Vec::new(),
        }
    }
}

impl ActionResponse {
    /// Treat a 2xx body that says `success: false` as a rejection.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` carrying the body's messages.
    pub fn accepted(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::Validation {
                status: 200,
                messages: self.message,
            })
        }
    }
}

/// Request body wrapper: every mutation sends `{ "data": … }`.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<'a, T> {
    pub data: &'a T,
}

const fn default_success() -> bool {
    true
}

/// Deserialize a string-or-list `message` into a list.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn message_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(messages_from_value(Some(&value)))
}
