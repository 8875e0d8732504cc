//! Filter sets for the club's paginated lists.
//!
//! Field order in `fields()` is part of each list's cache key; append new
//! fields at the end.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::cache::{FilterError, ListFilters};

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventCategory {
  /// No category restriction
  #[default]
  Todos,
  Sport,
  Social,
  Cultural,
  Kids,
  Gastronomy,
}

impl EventCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      EventCategory::Todos => "Todos",
      EventCategory::Sport => "SPORT",
      EventCategory::Social => "SOCIAL",
      EventCategory::Cultural => "CULTURAL",
      EventCategory::Kids => "KIDS",
      EventCategory::Gastronomy => "GASTRONOMY",
    }
  }
}

impl FromStr for EventCategory {
  type Err = FilterError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_uppercase().as_str() {
      "" | "TODOS" | "ALL" => Ok(EventCategory::Todos),
      "SPORT" => Ok(EventCategory::Sport),
      "SOCIAL" => Ok(EventCategory::Social),
      "CULTURAL" => Ok(EventCategory::Cultural),
      "KIDS" => Ok(EventCategory::Kids),
      "GASTRONOMY" => Ok(EventCategory::Gastronomy),
      _ => Err(FilterError::invalid("category", s, "unknown category")),
    }
  }
}

impl fmt::Display for EventCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilters {
  pub search: String,
  pub category: EventCategory,
  pub date_from: Option<NaiveDate>,
  pub date_to: Option<NaiveDate>,
}

impl ListFilters for EventFilters {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("search", self.search.clone()),
      ("category", self.category.as_str().to_string()),
      ("dateFrom", format_date(self.date_from)),
      ("dateTo", format_date(self.date_to)),
    ]
  }

  fn set(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
    match name {
      "search" => self.search = value.trim().to_string(),
      "category" => self.category = value.parse()?,
      "dateFrom" | "date_from" | "from" => self.date_from = parse_date("dateFrom", value)?,
      "dateTo" | "date_to" | "to" => self.date_to = parse_date("dateTo", value)?,
      other => return Err(FilterError::UnknownField(other.to_string())),
    }
    if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
      if from > to {
        return Err(FilterError::invalid(name, value, "date range ends before it starts"));
      }
    }
    Ok(())
  }

  fn query_params(&self) -> Vec<(&'static str, String)> {
    // "Todos" is the absence of a category filter for the server.
    self
      .fields()
      .into_iter()
      .filter(|(name, value)| !value.is_empty() && !(*name == "category" && value == "Todos"))
      .collect()
  }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilters {
  pub search: String,
  pub unread_only: bool,
  pub kind: Option<String>,
}

impl ListFilters for NotificationFilters {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("search", self.search.clone()),
      ("unreadOnly", if self.unread_only { "true" } else { "" }.to_string()),
      ("type", self.kind.clone().unwrap_or_default()),
    ]
  }

  fn set(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
    match name {
      "search" => self.search = value.trim().to_string(),
      "unreadOnly" | "unread_only" | "unread" => self.unread_only = parse_bool(name, value)?,
      "type" | "kind" => {
        self.kind = Some(value.trim().to_uppercase()).filter(|v| !v.is_empty());
      }
      other => return Err(FilterError::UnknownField(other.to_string())),
    }
    Ok(())
  }
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileSort {
  #[default]
  NewestFirst,
  OldestFirst,
  Name,
}

impl FileSort {
  pub fn as_str(&self) -> &'static str {
    match self {
      FileSort::NewestFirst => "newest",
      FileSort::OldestFirst => "oldest",
      FileSort::Name => "name",
    }
  }
}

impl FromStr for FileSort {
  type Err = FilterError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "" | "newest" => Ok(FileSort::NewestFirst),
      "oldest" => Ok(FileSort::OldestFirst),
      "name" => Ok(FileSort::Name),
      _ => Err(FilterError::invalid("sort", s, "expected newest, oldest or name")),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFilters {
  pub search: String,
  pub folder: Option<String>,
  pub sort: FileSort,
}

impl ListFilters for FileFilters {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("search", self.search.clone()),
      ("folder", self.folder.clone().unwrap_or_default()),
      ("sort", self.sort.as_str().to_string()),
    ]
  }

  fn set(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
    match name {
      "search" => self.search = value.trim().to_string(),
      "folder" => self.folder = Some(value.trim().to_string()).filter(|v| !v.is_empty()),
      "sort" => self.sort = value.parse()?,
      other => return Err(FilterError::UnknownField(other.to_string())),
    }
    Ok(())
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn format_date(date: Option<NaiveDate>) -> String {
  date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn parse_date(field: &str, value: &str) -> Result<Option<NaiveDate>, FilterError> {
  let value = value.trim();
  if value.is_empty() {
    return Ok(None);
  }
  NaiveDate::parse_from_str(value, "%Y-%m-%d")
    .map(Some)
    .map_err(|_| FilterError::invalid(field, value, "expected YYYY-MM-DD"))
}

fn parse_bool(field: &str, value: &str) -> Result<bool, FilterError> {
  match value.trim().to_lowercase().as_str() {
    "true" | "1" | "yes" | "si" | "sí" => Ok(true),
    "false" | "0" | "no" | "" => Ok(false),
    _ => Err(FilterError::invalid(field, value, "expected true or false")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::filter_key;

  #[test]
  fn test_event_key_default() {
    let f = EventFilters::default();
    assert_eq!(
      filter_key(&f, 1, 20),
      "search=&category=Todos&dateFrom=&dateTo=&page=1&limit=20"
    );
  }

  #[test]
  fn test_event_category_not_sent_when_todos() {
    let mut f = EventFilters::default();
    assert!(f.query_params().is_empty());

    f.set("category", "sport").unwrap();
    assert_eq!(f.query_params(), vec![("category", "SPORT".to_string())]);
  }

  #[test]
  fn test_event_date_range_validation() {
    let mut f = EventFilters::default();
    f.set("dateFrom", "2024-06-10").unwrap();
    assert!(f.clone().set("dateTo", "2024-06-01").is_err());
    f.set("dateTo", "2024-06-30").unwrap();
    assert_eq!(f.date_to, NaiveDate::from_ymd_opt(2024, 6, 30));

    assert!(f.set("dateTo", "30/06/2024").is_err());
  }

  #[test]
  fn test_search_is_trimmed_on_set() {
    let mut f = EventFilters::default();
    f.set("search", "  yoga ").unwrap();
    assert_eq!(f.search, "yoga");

    let mut g = EventFilters::default();
    g.set("search", "yoga").unwrap();
    assert_eq!(f, g);
    assert_eq!(filter_key(&f, 1, 20), filter_key(&g, 1, 20));
  }

  #[test]
  fn test_trailing_space_keeps_page() {
    use crate::cache::ListCache;
    use crate::club::types::Event;

    let mut cache: ListCache<EventFilters, Event> = ListCache::new(20);
    cache.set_filter("search", "a").unwrap();
    cache.set_page(3);
    let key = cache.get_key();

    cache.set_filter("search", "a ").unwrap();
    assert_eq!(cache.page(), 3);
    assert_eq!(cache.get_key(), key);

    cache.set_filter("search", "ab").unwrap();
    assert_eq!(cache.page(), 1);
  }

  #[test]
  fn test_notification_filters() {
    let mut f = NotificationFilters::default();
    f.set("unread", "yes").unwrap();
    f.set("type", "event").unwrap();
    assert_eq!(
      f.query_params(),
      vec![
        ("unreadOnly", "true".to_string()),
        ("type", "EVENT".to_string())
      ]
    );
    assert!(f.set("unread", "maybe").is_err());
  }

  #[test]
  fn test_file_filters() {
    let mut f = FileFilters::default();
    f.set("folder", "Actas").unwrap();
    f.set("sort", "name").unwrap();
    assert_eq!(f.sort, FileSort::Name);
    assert!(f.set("size", "10").is_err());
    f.set("folder", "").unwrap();
    assert_eq!(f.folder, None);
  }
}
