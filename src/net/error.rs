//! Error taxonomy for gateway and auth operations.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures never reach the network. Transport failures get a
//! generic user message, backend failures keep the server's `message`
//! verbatim, and a 401 is reported as `Unauthorized` after the gateway has
//! already applied the global forced logout.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

use super::transport::TransportError;
use crate::state::storage::StorageError;

const GENERIC_TRANSPORT_MESSAGE: &str = "unable to reach the notification service";
const SESSION_EXPIRED_MESSAGE: &str = "session expired; please log in again";

/// Errors produced by [`crate::net::api::ApiClient`] and [`crate::state::auth::AuthService`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input was rejected locally; no request was issued.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request never produced an HTTP response.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a non-success status other than 401.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// The backend rejected the credentials; the session has been cleared.
    #[error("unauthorized: {}", .message.as_deref().unwrap_or("no message"))]
    Unauthorized { message: Option<String> },

    /// A success response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// Durable session storage could not be written.
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),

    /// A login/signup is already pending.
    #[error("a request is already in flight")]
    RequestInFlight,
}

impl ApiError {
    /// Text suitable for showing inline next to the action that failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Backend { message, .. } => message.clone(),
            Self::Transport(_) => GENERIC_TRANSPORT_MESSAGE.to_owned(),
            Self::Unauthorized { message } => message.clone().unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_owned()),
            Self::Decode(_) => "unexpected response from the notification service".to_owned(),
            Self::Storage(_) => "unable to save the session locally".to_owned(),
            Self::RequestInFlight => "please wait for the current request to finish".to_owned(),
        }
    }

    /// Whether the error was handled globally and should not be shown inline.
    #[must_use]
    pub fn is_session_expiry(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Pull the `message` field out of an error body.
///
/// Accepts a string or an array of strings (joined with `", "`). Returns
/// `None` when the body is not JSON or carries no usable message.
#[must_use]
pub fn extract_backend_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    match value.get("message")? {
        Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        _ => None,
    }
}

pub(crate) fn status_failed_message(status: u16) -> String {
    format!("request failed with status {status}")
}
