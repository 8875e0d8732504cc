//! Domain types returned by the club backend.
//!
//! Field names follow the backend's camelCase JSON.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Cacheable;

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
  pub id: String,
  pub member_number: String,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  #[serde(default)]
  pub membership_type: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

impl Member {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token: String,
  #[serde(default)]
  pub refresh_token: Option<String>,
  pub user: Member,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
  pub email: &'a str,
  pub password: &'a str,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  pub category: String,
  pub starts_at: DateTime<Utc>,
  #[serde(default)]
  pub ends_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub capacity: Option<u32>,
  #[serde(default)]
  pub registered: u32,
  #[serde(default)]
  pub is_registered: bool,
}

impl Event {
  pub fn seats_left(&self) -> Option<u32> {
    self.capacity.map(|c| c.saturating_sub(self.registered))
  }
}

impl Cacheable for Event {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "event"
  }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: String,
  pub title: String,
  pub body: String,
  #[serde(default)]
  pub kind: Option<String>,
  #[serde(default)]
  pub read: bool,
  pub created_at: DateTime<Utc>,
}

impl Cacheable for Notification {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "notification"
  }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
  pub unread: u64,
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub folder: Option<String>,
  #[serde(default)]
  pub mime_type: Option<String>,
  #[serde(default)]
  pub size_bytes: u64,
  pub uploaded_at: DateTime<Utc>,
  #[serde(default)]
  pub url: Option<String>,
}

impl Cacheable for FileEntry {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "file"
  }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
  pub id: String,
  pub period: String,
  pub issued_on: NaiveDate,
  #[serde(default)]
  pub due_on: Option<NaiveDate>,
  /// Amount in cents
  pub amount: i64,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub paid: bool,
  #[serde(default)]
  pub pdf_url: Option<String>,
}

// ============================================================================
// Surveys
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub questions: Vec<SurveyQuestion>,
  #[serde(default)]
  pub answered: bool,
  #[serde(default)]
  pub closes_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
  pub id: String,
  pub text: String,
  #[serde(default)]
  pub options: Vec<String>,
  #[serde(default)]
  pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswer {
  pub question_id: String,
  pub value: String,
}

// ============================================================================
// QR access code
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCode {
  pub payload: String,
  #[serde(default)]
  pub expires_at: Option<DateTime<Utc>>,
}

/// Access code plus whether it came from the device cache.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessCodeResult {
  pub code: AccessCode,
  pub from_cache: bool,
}

// ============================================================================
// Reservations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
  pub id: String,
  pub name: String,
  pub opens_at: NaiveTime,
  pub closes_at: NaiveTime,
  /// Length of one bookable slot, in minutes
  pub slot_minutes: u32,
  /// Concurrent bookings allowed per slot (e.g., courts of the same kind)
  #[serde(default = "one")]
  pub capacity: u32,
}

fn one() -> u32 {
  1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
  pub id: String,
  pub facility_id: String,
  pub date: NaiveDate,
  pub starts_at: NaiveTime,
  pub ends_at: NaiveTime,
  #[serde(default)]
  pub status: Option<String>,
}

impl Reservation {
  /// Cancelled reservations do not hold a slot.
  pub fn is_active(&self) -> bool {
    !matches!(self.status.as_deref(), Some("CANCELLED"))
  }
}

/// Facility data plus the day's reservations, as returned by the schedule endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySchedule {
  pub facility: Facility,
  #[serde(default)]
  pub reservations: Vec<Reservation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
  pub facility_id: String,
  pub date: NaiveDate,
  pub starts_at: NaiveTime,
  pub ends_at: NaiveTime,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub guests: Option<u32>,
}

// ============================================================================
// Legal documents
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalDocumentKind {
  Terms,
  Privacy,
}

impl LegalDocumentKind {
  pub fn slug(&self) -> &'static str {
    match self {
      LegalDocumentKind::Terms => "terms",
      LegalDocumentKind::Privacy => "privacy",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalDocument {
  pub title: String,
  pub content: String,
  #[serde(default)]
  pub version: Option<String>,
}
