//! Text rendering for the command line. This is the only place user-facing
//! wording for errors is decided.

use chrono::{DateTime, Local, Utc};
use clubhouse::api::{ApiError, RecoveryAction};
use clubhouse::cache::{CacheSource, Cacheable, ListCache, ListFilters};
use clubhouse::club::types::{Event, FileEntry, Notification, Statement};
use clubhouse::club::TimeSlot;

/// One-line banner for an error, plus what the user can do about it.
pub fn error_banner(err: &ApiError) -> String {
  let text = match err {
    ApiError::Offline(_) => "Can't reach the club server. Check your connection.".to_string(),
    ApiError::Unauthorized => "Your session has expired.".to_string(),
    ApiError::Business { message, .. } => message.clone(),
    ApiError::Unexpected(detail) => format!("Something went wrong ({})", detail),
  };
  match recovery_hint(err.action()) {
    Some(hint) => format!("{} {}", text, hint),
    None => text,
  }
}

fn recovery_hint(action: RecoveryAction) -> Option<&'static str> {
  match action {
    RecoveryAction::Retry => Some("Try again in a moment."),
    RecoveryAction::Login => Some("Run `clubhouse login` to sign in again."),
    RecoveryAction::ContactSupport => Some("If this keeps happening, contact the club office."),
    RecoveryAction::UpdateApp => Some("Please update clubhouse to the latest version."),
    RecoveryAction::None => None,
  }
}

pub fn source_label(source: CacheSource, fetched_at: Option<DateTime<Utc>>) -> String {
  let when = fetched_at
    .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_default();
  match source {
    CacheSource::Empty => "no data".to_string(),
    CacheSource::CacheFresh => format!("updated {}", when),
    CacheSource::CacheStale => format!("showing data from {} (may be outdated)", when),
    CacheSource::Offline => format!("offline, showing data from {}", when),
  }
}

/// Header, rows and footer of a cached list.
pub fn render_list<F, T>(title: &str, cache: &ListCache<F, T>, row: impl Fn(&T) -> String) -> String
where
  F: ListFilters,
  T: Cacheable,
{
  let mut out = String::new();
  let p = cache.pagination();
  out.push_str(&format!(
    "{} [{}]\n",
    title,
    source_label(cache.source(), cache.fetched_at())
  ));

  if let Some(err) = cache.error() {
    out.push_str(&format!("! {}\n", error_banner(err)));
  }

  if cache.items().is_empty() {
    if cache.fetched_at().is_some() {
      out.push_str("  (nothing found)\n");
    }
  } else {
    for item in cache.items() {
      out.push_str(&format!("  {}\n", row(item)));
    }
  }

  if cache.fetched_at().is_some() {
    out.push_str(&format!(
      "page {}/{} · {} total\n",
      p.page,
      p.total_pages.max(1),
      p.total
    ));
  }
  out
}

pub fn event_row(e: &Event) -> String {
  let seats = match e.seats_left() {
    Some(0) => " · full".to_string(),
    Some(n) => format!(" · {} seats left", n),
    None => String::new(),
  };
  let mark = if e.is_registered { "✓" } else { " " };
  format!(
    "{} {}  {:<10} {}{}",
    mark,
    e.starts_at.with_timezone(&Local).format("%d/%m %H:%M"),
    e.category,
    e.title,
    seats
  )
}

pub fn notification_row(n: &Notification) -> String {
  let mark = if n.read { " " } else { "•" };
  format!(
    "{} {}  {}: {}",
    mark,
    n.created_at.with_timezone(&Local).format("%d/%m %H:%M"),
    n.title,
    n.body
  )
}

pub fn file_row(f: &FileEntry) -> String {
  format!(
    "{}  {:<40} {}",
    f.uploaded_at.with_timezone(&Local).format("%d/%m/%Y"),
    f.name,
    human_size(f.size_bytes)
  )
}

pub fn statement_row(s: &Statement) -> String {
  let status = if s.paid { "paid" } else { "due" };
  format!(
    "{}  {:>12} {}  {}",
    s.period,
    format_amount(s.amount),
    s.currency.as_deref().unwrap_or(""),
    status
  )
}

pub fn slot_row(s: &TimeSlot) -> String {
  let state = if s.available {
    format!("{} free", s.remaining)
  } else if s.remaining == 0 {
    "full".to_string()
  } else {
    "closed".to_string()
  };
  format!(
    "{}-{}  {}",
    s.starts_at.format("%H:%M"),
    s.ends_at.format("%H:%M"),
    state
  )
}

fn format_amount(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

fn human_size(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
  let mut size = bytes as f64;
  let mut unit = 0;
  while size >= 1024.0 && unit < UNITS.len() - 1 {
    size /= 1024.0;
    unit += 1;
  }
  if unit == 0 {
    format!("{} {}", bytes, UNITS[0])
  } else {
    format!("{:.1} {}", size, UNITS[unit])
  }
}
