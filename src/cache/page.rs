//! The cached page of a list and how new results are folded into it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::traits::Cacheable;
use crate::api::{Page, Pagination};

/// How a successful fetch is folded into the cached page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
  /// Every fetch replaces the page wholesale.
  #[default]
  Replace,
  /// Page 1 replaces; later pages are appended, skipping known identities.
  Append,
}

/// Last successful result set of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage<T> {
  pub items: Vec<T>,
  pub filter_key: String,
  pub fetched_at: Option<DateTime<Utc>>,
  pub pagination: Pagination,
}

impl<T> Default for CachedPage<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      filter_key: String::new(),
      fetched_at: None,
      pagination: Pagination::default(),
    }
  }
}

impl<T: Cacheable> CachedPage<T> {
  /// Fold a fetched page in. Does not touch `filter_key`/`fetched_at`.
  pub fn merge(&mut self, page: Page<T>, requested_page: u32, mode: MergeMode) {
    match mode {
      MergeMode::Replace => self.items = page.items,
      MergeMode::Append => {
        if requested_page <= 1 {
          self.items.clear();
        }
        let mut known: HashSet<String> = self.items.iter().map(|i| i.cache_key()).collect();
        for item in page.items {
          if known.insert(item.cache_key()) {
            self.items.push(item);
          }
        }
      }
    }
    self.pagination = Pagination {
      page: requested_page,
      ..page.pagination
    };
  }
}
