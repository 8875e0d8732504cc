//! Stored credentials.

use color_eyre::Result;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::{keys, KvStore};

/// Handle over the persisted auth and refresh tokens.
///
/// Clones share the same in-memory token, if one was pinned.
#[derive(Clone)]
pub struct Session {
  store: Arc<dyn KvStore>,
  pinned: Arc<Mutex<Option<String>>>,
}

impl Session {
  pub fn new(store: Arc<dyn KvStore>) -> Self {
    Self {
      store,
      pinned: Arc::new(Mutex::new(None)),
    }
  }

  /// Use `token` for this process only. It wins over the stored token and is
  /// never written to the store.
  pub fn with_token(self, token: impl Into<String>) -> Self {
    *self.pinned_slot() = Some(token.into()).filter(|t| !t.is_empty());
    self
  }

  fn pinned_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
    self.pinned.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  pub fn token(&self) -> Result<Option<String>> {
    if let Some(token) = self.pinned_slot().clone() {
      return Ok(Some(token));
    }
    Ok(self.store.get(keys::AUTH_TOKEN)?.filter(|t| !t.is_empty()))
  }

  pub fn refresh_token(&self) -> Result<Option<String>> {
    self.store.get(keys::REFRESH_TOKEN)
  }

  pub fn is_authenticated(&self) -> Result<bool> {
    Ok(self.token()?.is_some())
  }

  /// Store credentials after a successful login.
  pub fn store_tokens(&self, token: &str, refresh_token: Option<&str>) -> Result<()> {
    self.store.set(keys::AUTH_TOKEN, token)?;
    match refresh_token {
      Some(refresh) => self.store.set(keys::REFRESH_TOKEN, refresh)?,
      None => self.store.remove(keys::REFRESH_TOKEN)?,
    }
    info!("session stored");
    Ok(())
  }

  /// Drop both tokens and every persisted list page, which belong to the
  /// member who is signing out.
  pub fn clear(&self) -> Result<()> {
    *self.pinned_slot() = None;
    self.store.remove(keys::AUTH_TOKEN)?;
    self.store.remove(keys::REFRESH_TOKEN)?;
    self
      .store
      .remove_prefix(&format!("{}:", keys::SNAPSHOT_PREFIX))?;
    info!("session cleared");
    Ok(())
  }
}
