//! Serde types matching the backend's response envelopes.
//!
//! Every endpoint answers either `{ success: true, data, message? }` or
//! `{ success: false, errorCode, message, action, fields?, timestamp?, path? }`.

use serde::{Deserialize, Serialize};

/// Outer shape of a 2xx body, before `data` is decoded into its real type.
///
/// `data` is kept as a raw value so endpoints without a payload decode into
/// `()` from a missing or null field.
#[derive(Debug, Deserialize)]
pub struct SuccessEnvelope {
  pub success: Option<bool>,
  #[serde(default)]
  pub data: serde_json::Value,
  pub message: Option<String>,
}

impl SuccessEnvelope {
  /// A 2xx body can still carry `success: false`.
  pub fn is_failure(&self) -> bool {
    self.success == Some(false)
  }
}

/// Error response wrapper.
///
/// All fields are optional on the wire so a half-formed body from a proxy
/// still deserializes; missing pieces fall back to status-based defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
  #[serde(rename = "errorCode")]
  pub error_code: Option<String>,
  pub message: Option<String>,
  #[serde(default, deserialize_with = "lenient_action")]
  pub action: RecoveryAction,
  pub fields: Option<serde_json::Value>,
  pub timestamp: Option<String>,
  pub path: Option<String>,
}

impl ErrorEnvelope {
  /// Read an error body field by field, so one oddly typed field does not
  /// cost the server's message. Anything that is not a JSON object yields the
  /// empty envelope.
  pub fn from_body(body: &[u8]) -> Self {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(body) else {
      return Self::default();
    };
    let text = |key: &str| map.get(key).and_then(|v| v.as_str()).map(str::to_string);

    Self {
      error_code: text("errorCode"),
      message: text("message"),
      action: map
        .get("action")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default(),
      fields: map.get("fields").filter(|v| !v.is_null()).cloned(),
      timestamp: text("timestamp"),
      path: text("path"),
    }
  }
}

/// `null`, numbers and unknown strings all mean no recovery action.
fn lenient_action<'de, D>(deserializer: D) -> Result<RecoveryAction, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(
    raw
      .and_then(|v| serde_json::from_value(v).ok())
      .unwrap_or_default(),
  )
}

/// What the client should offer the user after an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryAction {
  Retry,
  Login,
  ContactSupport,
  UpdateApp,
  #[default]
  #[serde(other)]
  None,
}

/// Page metadata attached to list responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
  #[serde(default = "first_page")]
  pub page: u32,
  #[serde(default)]
  pub limit: u32,
  #[serde(default)]
  pub total: u64,
  #[serde(rename = "totalPages", default)]
  pub total_pages: u32,
}

fn first_page() -> u32 {
  1
}

impl Pagination {
  pub fn has_next(&self) -> bool {
    self.page < self.total_pages
  }
}

/// `data` payload of list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
  #[serde(default = "Vec::new")]
  pub items: Vec<T>,
  #[serde(default)]
  pub pagination: Pagination,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
    Self { items, pagination }
  }
}
