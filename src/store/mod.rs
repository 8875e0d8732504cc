//! On-device persistent state: credentials, preferences, cached payloads.

mod kv;
mod preferences;
mod session;

pub use kv::{KvStore, MemoryKvStore, SqliteKvStore};
pub use preferences::{Language, NotificationPreferences, Preferences, Theme};
pub use session::Session;

/// Storage keys. These are shared with previously installed clients and must not change.
pub mod keys {
  pub const AUTH_TOKEN: &str = "authToken";
  pub const REFRESH_TOKEN: &str = "refreshToken";
  pub const USER_THEME: &str = "userTheme";
  pub const USER_LANGUAGE: &str = "userLanguage";
  pub const CACHED_QR_DATA: &str = "cached_qr_data";
  pub const NOTIFICATION_PREFERENCES: &str = "notificationPreferences";
  /// Prefix for persisted list pages, see `cache::Feed`.
  pub const SNAPSHOT_PREFIX: &str = "snapshot";
}
