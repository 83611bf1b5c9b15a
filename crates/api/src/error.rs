//! Error taxonomy for backend calls.
//!
//! The backend reports failures as a JSON body whose `message` is either a
//! single string or a list of strings. Both shapes are normalized into a
//! `Vec<String>` so callers can join them for display.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, TLS).
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// Session missing, expired or rejected (401/403).
    #[error("Unauthorized ({status}): {}", join_or_placeholder(.messages))]
    Unauthorized { status: u16, messages: Vec<String> },

    /// Request rejected by the backend (any other 4xx).
    #[error("Validation failed ({status}): {}", join_or_placeholder(.messages))]
    Validation { status: u16, messages: Vec<String> },

    /// Resource does not exist (404).
    #[error("Not found: {}", join_or_placeholder(.messages))]
    NotFound { messages: Vec<String> },

    /// Backend failed (5xx or an unexpected status).
    #[error("Server fault ({status}): {}", join_or_placeholder(.messages))]
    ServerFault { status: u16, messages: Vec<String> },

    /// Response body was not the expected JSON.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Endpoint could not be resolved against the configured base URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// Classify a non-success response by status code.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let messages = server_messages(body);
        match status {
            401 | 403 => Self::Unauthorized { status, messages },
            404 => Self::NotFound { messages },
            400..=499 => Self::Validation { status, messages },
            _ => Self::ServerFault { status, messages },
        }
    }

    /// HTTP status, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Unauthorized { status, .. }
            | Self::Validation { status, .. }
            | Self::ServerFault { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Decode(_) | Self::InvalidEndpoint(_) => None,
        }
    }

    /// Messages reported by the backend, in order.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Unauthorized { messages, .. }
            | Self::Validation { messages, .. }
            | Self::NotFound { messages }
            | Self::ServerFault { messages, .. } => messages,
            Self::Network(_) | Self::Decode(_) | Self::InvalidEndpoint(_) => &[],
        }
    }

    /// Backend messages joined by a space, or `None` when the backend said nothing.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let messages = self.messages();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join(" "))
        }
    }

    /// Whether the session was rejected.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Extract `message` from an error body as a list.
///
/// Non-JSON bodies and bodies without a usable `message` yield an empty list.
#[must_use]
pub fn server_messages(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    messages_from_value(value.get("message"))
}

/// Normalize a `message` value (string or list) into a list of strings.
#[must_use]
pub fn messages_from_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn join_or_placeholder(messages: &[String]) -> String {
    if messages.is_empty() {
        "(no message)".to_string()
    } else {
        messages.join(" ")
    }
}
