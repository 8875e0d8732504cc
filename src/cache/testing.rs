//! Fixtures shared by the cache tests.

use serde::{Deserialize, Serialize};

use super::filters::{FilterError, ListFilters};
use super::traits::Cacheable;
use crate::api::{Page, Pagination};

#[derive(Debug, Clone, PartialEq)]
pub struct TestFilters {
  pub search: String,
  pub category: String,
}

impl Default for TestFilters {
  fn default() -> Self {
    Self {
      search: String::new(),
      category: "Todos".to_string(),
    }
  }
}

impl ListFilters for TestFilters {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("search", self.search.clone()),
      ("category", self.category.clone()),
    ]
  }

  fn set(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
    match name {
      "search" => self.search = value.to_string(),
      "category" => self.category = value.to_string(),
      other => return Err(FilterError::UnknownField(other.to_string())),
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub id: String,
}

impl Cacheable for Item {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "item"
  }
}

pub fn items(ids: &[&str]) -> Vec<Item> {
  ids
    .iter()
    .map(|id| Item { id: id.to_string() })
    .collect()
}

pub fn page_of(ids: &[&str], page: u32, total_pages: u32) -> Page<Item> {
  Page::new(
    items(ids),
    Pagination {
      page,
      limit: 20,
      total: ids.len() as u64,
      total_pages,
    },
  )
}
