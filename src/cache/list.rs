//! Paginated list cache: current query, last good page, and the decision
//! whether a fetch is needed.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::filters::{filter_key, FilterError, ListFilters};
use super::page::{CachedPage, MergeMode};
use super::traits::{CacheSource, Cacheable};
use crate::api::{ApiError, Page, Pagination};

/// Parameters of one fetch, captured when the fetch was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest<F> {
  pub filters: F,
  pub page: u32,
  pub limit: u32,
}

/// Handle for an issued fetch. Its result is only applied if no newer fetch
/// was issued in the meantime.
#[derive(Debug, Clone)]
pub struct FetchTicket<F> {
  seq: u64,
  key: String,
  request: FetchRequest<F>,
}

impl<F> FetchTicket<F> {
  pub fn seq(&self) -> u64 {
    self.seq
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn request(&self) -> &FetchRequest<F> {
    &self.request
  }
}

/// What happened to a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
  /// The cache was valid, nothing was requested.
  Fresh,
  /// A fetch for the same query is already outstanding.
  InFlight,
  /// The result replaced (or extended) the cached page.
  Applied,
  /// The request failed; cached items are untouched.
  Failed(ApiError),
  /// A newer fetch was issued; this result was discarded.
  Superseded,
}

#[derive(Debug, Clone)]
struct Pending {
  seq: u64,
  key: String,
}

/// Cache state for one paginated list.
///
/// Setters never evaluate validity; `is_valid` is computed on each call
/// because it depends on wall-clock time.
#[derive(Debug)]
pub struct ListCache<F: ListFilters, T: Cacheable> {
  filters: F,
  page: u32,
  limit: u32,
  ttl: Option<Duration>,
  mode: MergeMode,
  cached: CachedPage<T>,
  error: Option<ApiError>,
  last_seq: u64,
  pending: Option<Pending>,
}

impl<F: ListFilters, T: Cacheable> ListCache<F, T> {
  /// Create an empty cache with default filters, page 1, no TTL.
  pub fn new(limit: u32) -> Self {
    Self {
      filters: F::default(),
      page: 1,
      limit: limit.max(1),
      ttl: None,
      mode: MergeMode::Replace,
      cached: CachedPage::default(),
      error: None,
      last_seq: 0,
      pending: None,
    }
  }

  /// Set the time after which a fetched page is stale. `None` keeps a page
  /// valid until the query changes.
  pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn with_mode(mut self, mode: MergeMode) -> Self {
    self.mode = mode;
    self
  }

  // --------------------------------------------------------------------------
  // Query state
  // --------------------------------------------------------------------------

  /// Cache key for the active filters and page.
  pub fn get_key(&self) -> String {
    filter_key(&self.filters, self.page, self.limit)
  }

  pub fn filters(&self) -> &F {
    &self.filters
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn limit(&self) -> u32 {
    self.limit
  }

  pub fn set_page(&mut self, page: u32) {
    self.page = page.max(1);
  }

  /// Advance to the next page if the server reported one.
  pub fn next_page(&mut self) -> bool {
    if self.cached.fetched_at.is_some() && self.cached.pagination.has_next() {
      self.page = self.cached.pagination.page + 1;
      true
    } else {
      false
    }
  }

  /// Set one filter by name. A change resets the page to 1.
  pub fn set_filter(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
    let mut next = self.filters.clone();
    next.set(name, value)?;
    self.replace_filters(next);
    Ok(())
  }

  /// Mutate filters in place. A change resets the page to 1.
  pub fn update_filters(&mut self, update: impl FnOnce(&mut F)) {
    let mut next = self.filters.clone();
    update(&mut next);
    self.replace_filters(next);
  }

  /// Restore default filters and go back to page 1.
  pub fn reset_filters(&mut self) {
    self.filters = F::default();
    self.page = 1;
  }

  fn replace_filters(&mut self, next: F) {
    if next != self.filters {
      self.filters = next;
      self.page = 1;
    }
  }

  // --------------------------------------------------------------------------
  // Validity
  // --------------------------------------------------------------------------

  pub fn is_valid(&self) -> bool {
    self.is_valid_at(Utc::now())
  }

  /// True when a page was fetched, it belongs to the active query, and it is
  /// younger than the TTL.
  pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
    let Some(fetched_at) = self.cached.fetched_at else {
      return false;
    };
    if self.cached.filter_key != self.get_key() {
      return false;
    }
    match self.ttl {
      Some(ttl) => now - fetched_at < ttl,
      None => true,
    }
  }

  /// Record that the active query was fetched now.
  pub fn mark_fetched(&mut self) {
    self.mark_fetched_at(self.get_key(), Utc::now());
  }

  fn mark_fetched_at(&mut self, key: String, at: DateTime<Utc>) {
    self.cached.filter_key = key;
    self.cached.fetched_at = Some(at);
  }

  /// Where the data on display comes from.
  pub fn source(&self) -> CacheSource {
    if self.cached.fetched_at.is_none() {
      CacheSource::Empty
    } else if self.error.as_ref().is_some_and(ApiError::is_offline) {
      CacheSource::Offline
    } else if self.is_valid() {
      CacheSource::CacheFresh
    } else {
      CacheSource::CacheStale
    }
  }

  // --------------------------------------------------------------------------
  // Fetch lifecycle
  // --------------------------------------------------------------------------

  /// Issue a fetch for the active query.
  ///
  /// Returns `None` when a fetch for the same key is already outstanding.
  /// A fetch for a different key supersedes the outstanding one.
  pub fn begin_fetch(&mut self) -> Option<FetchTicket<F>> {
    let key = self.get_key();
    if let Some(pending) = &self.pending {
      if pending.key == key {
        debug!(%key, seq = pending.seq, "fetch already in flight");
        return None;
      }
      debug!(old = pending.seq, "superseding in-flight fetch");
    }

    self.last_seq += 1;
    self.pending = Some(Pending {
      seq: self.last_seq,
      key: key.clone(),
    });

    Some(FetchTicket {
      seq: self.last_seq,
      key,
      request: FetchRequest {
        filters: self.filters.clone(),
        page: self.page,
        limit: self.limit,
      },
    })
  }

  /// Apply the result of a fetch issued by `begin_fetch`.
  pub fn complete(
    &mut self,
    ticket: FetchTicket<F>,
    result: Result<Page<T>, ApiError>,
  ) -> FetchOutcome {
    match &self.pending {
      Some(pending) if pending.seq == ticket.seq => {}
      _ => {
        debug!(seq = ticket.seq, latest = self.last_seq, "discarding superseded result");
        return FetchOutcome::Superseded;
      }
    }
    self.pending = None;

    match result {
      Ok(page) => {
        self
          .cached
          .merge(page, ticket.request.page, self.mode);
        self.mark_fetched_at(ticket.key, Utc::now());
        self.error = None;
        FetchOutcome::Applied
      }
      Err(e) => {
        debug!(seq = ticket.seq, "fetch failed, keeping cached page: {}", e);
        self.error = Some(e.clone());
        FetchOutcome::Failed(e)
      }
    }
  }

  /// Seed an empty cache with a persisted page. Ignored once data exists.
  pub fn restore(&mut self, snapshot: CachedPage<T>) -> bool {
    if self.cached.fetched_at.is_some() || snapshot.fetched_at.is_none() {
      return false;
    }
    self.cached = snapshot;
    true
  }

  pub fn is_loading(&self) -> bool {
    self.pending.is_some()
  }

  // --------------------------------------------------------------------------
  // Cached data
  // --------------------------------------------------------------------------

  pub fn items(&self) -> &[T] {
    &self.cached.items
  }

  pub fn pagination(&self) -> &Pagination {
    &self.cached.pagination
  }

  pub fn cached(&self) -> &CachedPage<T> {
    &self.cached
  }

  pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
    self.cached.fetched_at
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  pub fn clear_error(&mut self) {
    self.error = None;
  }
}
