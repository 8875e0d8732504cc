//! Typed outcome of a failed backend call.

use thiserror::Error;

use super::envelope::{ErrorEnvelope, RecoveryAction};

/// Error categories surfaced by the gateway.
///
/// The front end decides user-facing text; the variants only carry what the
/// server said plus enough context to pick a recovery action.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
  /// The server could not be reached (connect failure, DNS, timeout).
  #[error("server unreachable: {0}")]
  Offline(String),

  /// HTTP 401. Credentials have already been cleared when this is returned.
  #[error("session expired")]
  Unauthorized,

  /// Any other rejection by the server (4xx/5xx or `success: false`).
  #[error("{message}")]
  Business {
    status: u16,
    code: Option<String>,
    message: String,
    action: RecoveryAction,
    fields: Option<serde_json::Value>,
    timestamp: Option<String>,
    path: Option<String>,
  },

  /// Malformed response or a failure that fits no other category.
  #[error("unexpected error: {0}")]
  Unexpected(String),
}

impl ApiError {
  /// Build a business error from a status code and a (possibly empty) error envelope.
  pub(crate) fn from_envelope(status: u16, envelope: ErrorEnvelope) -> Self {
    let message = envelope
      .message
      .filter(|m| !m.trim().is_empty())
      .unwrap_or_else(|| fallback_message(status).to_string());

    ApiError::Business {
      status,
      code: envelope.error_code,
      message,
      action: envelope.action,
      fields: envelope.fields,
      timestamp: envelope.timestamp,
      path: envelope.path,
    }
  }

  pub fn is_offline(&self) -> bool {
    matches!(self, ApiError::Offline(_))
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, ApiError::Unauthorized)
  }

  /// Recovery action to offer for this error.
  pub fn action(&self) -> RecoveryAction {
    match self {
      ApiError::Offline(_) => RecoveryAction::Retry,
      ApiError::Unauthorized => RecoveryAction::Login,
      ApiError::Business { action, .. } => *action,
      ApiError::Unexpected(_) => RecoveryAction::Retry,
    }
  }
}

/// Fixed text used when the server gives no message.
pub fn fallback_message(status: u16) -> &'static str {
  match status {
    400 => "The request was invalid. Check the entered data and try again.",
    401 => "Your session has expired. Please sign in again.",
    403 => "You do not have permission to perform this action.",
    404 => "The requested resource was not found.",
    409 => "The request conflicts with an existing record.",
    422 => "Some of the entered data is not valid.",
    500 => "The server had a problem processing the request. Try again later.",
    502 | 503 | 504 => "The service is temporarily unavailable. Try again later.",
    _ => "Something went wrong while talking to the server.",
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_connect() || e.is_timeout() || e.is_request() {
      ApiError::Offline(e.to_string())
    } else if e.is_decode() || e.is_body() {
      ApiError::Unexpected(format!("invalid response body: {}", e))
    } else {
      ApiError::Unexpected(e.to_string())
    }
  }
}
