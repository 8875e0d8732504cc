//! Shared handle over a list cache that drives fetches.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::filters::ListFilters;
use super::list::{FetchOutcome, FetchRequest, FetchTicket, ListCache};
use super::snapshot::SnapshotStore;
use super::traits::Cacheable;
use crate::api::{ApiError, Page};

/// Cloneable handle over one list's cache.
///
/// The lock is only held around state transitions, never across the network
/// call, so a screen can keep reading the cached page while a fetch runs.
pub struct Feed<F: ListFilters, T: Cacheable> {
  state: Arc<Mutex<ListCache<F, T>>>,
  snapshots: Option<SnapshotStore>,
}

impl<F: ListFilters, T: Cacheable> Clone for Feed<F, T> {
  fn clone(&self) -> Self {
    Self {
      state: Arc::clone(&self.state),
      snapshots: self.snapshots.clone(),
    }
  }
}

impl<F: ListFilters, T: Cacheable> Feed<F, T> {
  pub fn new(cache: ListCache<F, T>) -> Self {
    Self {
      state: Arc::new(Mutex::new(cache)),
      snapshots: None,
    }
  }

  /// Persist every applied page so it can be shown on the next start.
  pub fn with_snapshots(mut self, snapshots: SnapshotStore) -> Self {
    self.snapshots = Some(snapshots);
    self
  }

  /// Lock the cache. A panic while holding the lock cannot leave it
  /// half-updated (every transition is a plain field write), so poisoning is
  /// ignored.
  pub fn lock(&self) -> MutexGuard<'_, ListCache<F, T>> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Run a closure against the cache.
  pub fn with<R>(&self, f: impl FnOnce(&mut ListCache<F, T>) -> R) -> R {
    f(&mut self.lock())
  }

  /// Fetch only if the cached page is not valid for the active query.
  pub async fn load<Fetch, Fut>(&self, fetcher: Fetch) -> FetchOutcome
  where
    Fetch: FnOnce(FetchRequest<F>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
  {
    let ticket = {
      let mut cache = self.lock();
      if cache.is_valid() {
        debug!(entity = T::entity_type(), "cache valid, skipping fetch");
        return FetchOutcome::Fresh;
      }
      cache.begin_fetch()
    };

    match ticket {
      Some(ticket) => self.run(ticket, fetcher).await,
      None => FetchOutcome::InFlight,
    }
  }

  /// Fetch regardless of validity (pull-to-refresh). Still guarded against
  /// a duplicate in-flight fetch.
  pub async fn refresh<Fetch, Fut>(&self, fetcher: Fetch) -> FetchOutcome
  where
    Fetch: FnOnce(FetchRequest<F>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
  {
    let ticket = self.lock().begin_fetch();
    match ticket {
      Some(ticket) => self.run(ticket, fetcher).await,
      None => FetchOutcome::InFlight,
    }
  }

  async fn run<Fetch, Fut>(&self, ticket: FetchTicket<F>, fetcher: Fetch) -> FetchOutcome
  where
    Fetch: FnOnce(FetchRequest<F>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
  {
    let result = fetcher(ticket.request().clone()).await;
    if let Err(e) = &result {
      warn!(entity = T::entity_type(), "list fetch failed: {}", e);
    }

    let (outcome, snapshot) = {
      let mut cache = self.lock();
      let outcome = cache.complete(ticket, result);
      let snapshot = match (&outcome, &self.snapshots) {
        (FetchOutcome::Applied, Some(_)) => Some(cache.cached().clone()),
        _ => None,
      };
      (outcome, snapshot)
    };

    if let (Some(snapshots), Some(page)) = (&self.snapshots, snapshot) {
      snapshots.save(&page);
    }
    outcome
  }

  /// Seed an empty cache from the snapshot of the active query, if any.
  pub fn restore_snapshot(&self) -> bool {
    let Some(snapshots) = &self.snapshots else {
      return false;
    };
    let key = self.lock().get_key();
    match snapshots.load::<T>(&key) {
      Some(page) => {
        let restored = self.lock().restore(page);
        if restored {
          debug!(entity = T::entity_type(), "restored snapshot");
        }
        restored
      }
      None => false,
    }
  }

  /// Copy of the cached items.
  pub fn items(&self) -> Vec<T> {
    self.lock().items().to_vec()
  }
}
