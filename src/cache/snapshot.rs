//! Persisted copies of the last good page per query.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

use super::page::CachedPage;
use super::traits::Cacheable;
use crate::store::{keys, KvStore};

/// Writes and reads page snapshots through the device key-value store.
///
/// Failures are logged and swallowed: a snapshot is a convenience for warm
/// starts, never a reason to fail a fetch.
#[derive(Clone)]
pub struct SnapshotStore {
  store: Arc<dyn KvStore>,
}

impl SnapshotStore {
  pub fn new(store: Arc<dyn KvStore>) -> Self {
    Self { store }
  }

  /// Storage key for a filter key.
  ///
  /// SHA256 keeps keys fixed-length regardless of search text.
  pub fn storage_key<T: Cacheable>(filter_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filter_key.as_bytes());
    format!(
      "{}:{}:{}",
      keys::SNAPSHOT_PREFIX,
      T::entity_type(),
      hex::encode(hasher.finalize())
    )
  }

  pub fn save<T: Cacheable>(&self, page: &CachedPage<T>) {
    let key = Self::storage_key::<T>(&page.filter_key);
    let blob = match serde_json::to_string(page) {
      Ok(blob) => blob,
      Err(e) => {
        warn!(entity = T::entity_type(), "failed to serialize snapshot: {}", e);
        return;
      }
    };
    if let Err(e) = self.store.set(&key, &blob) {
      warn!(entity = T::entity_type(), "failed to write snapshot: {}", e);
    }
  }

  pub fn load<T: Cacheable>(&self, filter_key: &str) -> Option<CachedPage<T>> {
    let key = Self::storage_key::<T>(filter_key);
    let blob = match self.store.get(&key) {
      Ok(blob) => blob?,
      Err(e) => {
        warn!(entity = T::entity_type(), "failed to read snapshot: {}", e);
        return None;
      }
    };

    match serde_json::from_str::<CachedPage<T>>(&blob) {
      // Guard against a hash collision or a hand-edited store.
      Ok(page) if page.filter_key == filter_key => Some(page),
      Ok(_) => None,
      Err(e) => {
        debug!(entity = T::entity_type(), "discarding unreadable snapshot: {}", e);
        None
      }
    }
  }
}
