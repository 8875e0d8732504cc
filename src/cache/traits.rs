//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for records that can be held in a list cache.
///
/// Implementors must provide a stable identity, used to deduplicate appended
/// pages, and a type name used to organize persisted snapshots.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Unique identifier for this record (e.g., event id, file id)
  fn cache_key(&self) -> String;

  /// Entity type name for storage organization (e.g., "event", "file")
  fn entity_type() -> &'static str;
}

/// Indicates where the displayed data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Nothing fetched or restored yet
  Empty,
  /// Matches the active query and is within its TTL
  CacheFresh,
  /// Last good data, but the query changed or the TTL elapsed
  CacheStale,
  /// Last good data, and the latest refresh could not reach the server
  Offline,
}
