//! Filter state participating in a list's cache key.

use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
  #[error("unknown filter '{0}'")]
  UnknownField(String),

  #[error("invalid value '{value}' for filter '{field}': {reason}")]
  InvalidValue {
    field: String,
    value: String,
    reason: String,
  },
}

impl FilterError {
  pub fn invalid(field: &str, value: &str, reason: impl Into<String>) -> Self {
    FilterError::InvalidValue {
      field: field.to_string(),
      value: value.to_string(),
      reason: reason.into(),
    }
  }
}

/// Filter parameters of one paginated list.
///
/// Implementors list their fields in a fixed order. That order is part of the
/// cache key and of persisted snapshot names, so reordering fields orphans
/// every stored snapshot.
pub trait ListFilters: Clone + Default + PartialEq + Send + 'static {
  /// All filter fields as `(name, value)`, in fixed order. Unset fields
  /// report an empty value rather than being skipped.
  fn fields(&self) -> Vec<(&'static str, String)>;

  /// Set one field from its textual form.
  fn set(&mut self, name: &str, value: &str) -> Result<(), FilterError>;

  /// Query parameters sent to the server. Defaults to the non-empty fields.
  fn query_params(&self) -> Vec<(&'static str, String)> {
    self
      .fields()
      .into_iter()
      .filter(|(_, v)| !v.is_empty())
      .collect()
  }
}

/// Derive the cache key for a filter state plus page position.
///
/// Values are form-encoded so a search text containing separators cannot
/// collide with a different combination of fields.
pub fn filter_key<F: ListFilters>(filters: &F, page: u32, limit: u32) -> String {
  let mut serializer = form_urlencoded::Serializer::new(String::new());
  for (name, value) in filters.fields() {
    serializer.append_pair(name, &value);
  }
  serializer.append_pair("page", &page.to_string());
  serializer.append_pair("limit", &limit.to_string());
  serializer.finish()
}
