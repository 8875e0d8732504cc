//! User preferences persisted on the device.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{keys, KvStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
  Light,
  Dark,
  #[default]
  System,
}

impl Theme {
  fn as_str(&self) -> &'static str {
    match self {
      Theme::Light => "light",
      Theme::Dark => "dark",
      Theme::System => "system",
    }
  }
}

impl FromStr for Theme {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "light" => Ok(Theme::Light),
      "dark" => Ok(Theme::Dark),
      "system" => Ok(Theme::System),
      other => Err(eyre!("Unknown theme '{}' (expected light, dark or system)", other)),
    }
  }
}

impl fmt::Display for Theme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
  #[default]
  Es,
  En,
}

impl Language {
  fn as_str(&self) -> &'static str {
    match self {
      Language::Es => "es",
      Language::En => "en",
    }
  }
}

impl FromStr for Language {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "es" => Ok(Language::Es),
      "en" => Ok(Language::En),
      other => Err(eyre!("Unsupported language '{}' (expected es or en)", other)),
    }
  }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Which notification channels the member wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
  #[serde(default = "enabled")]
  pub push_enabled: bool,
  #[serde(default = "enabled")]
  pub events: bool,
  #[serde(default = "enabled")]
  pub reservations: bool,
  #[serde(default = "enabled")]
  pub statements: bool,
  #[serde(default)]
  pub promotions: bool,
}

fn enabled() -> bool {
  true
}

impl Default for NotificationPreferences {
  fn default() -> Self {
    Self {
      push_enabled: true,
      events: true,
      reservations: true,
      statements: true,
      promotions: false,
    }
  }
}

/// Handle over theme, language and notification preferences.
#[derive(Clone)]
pub struct Preferences {
  store: Arc<dyn KvStore>,
}

impl Preferences {
  pub fn new(store: Arc<dyn KvStore>) -> Self {
    Self { store }
  }

  /// Stored theme. Unreadable values fall back to the default.
  pub fn theme(&self) -> Result<Theme> {
    Ok(
      self
        .store
        .get(keys::USER_THEME)?
        .and_then(|v| v.parse().ok())
        .unwrap_or_default(),
    )
  }

  pub fn set_theme(&self, theme: Theme) -> Result<()> {
    self.store.set(keys::USER_THEME, theme.as_str())
  }

  pub fn language(&self) -> Result<Language> {
    Ok(
      self
        .store
        .get(keys::USER_LANGUAGE)?
        .and_then(|v| v.parse().ok())
        .unwrap_or_default(),
    )
  }

  pub fn set_language(&self, language: Language) -> Result<()> {
    self.store.set(keys::USER_LANGUAGE, language.as_str())
  }

  pub fn notifications(&self) -> Result<NotificationPreferences> {
    match self.store.get(keys::NOTIFICATION_PREFERENCES)? {
      Some(blob) => Ok(serde_json::from_str(&blob).unwrap_or_default()),
      None => Ok(NotificationPreferences::default()),
    }
  }

  pub fn set_notifications(&self, prefs: &NotificationPreferences) -> Result<()> {
    let blob = serde_json::to_string(prefs)
      .map_err(|e| eyre!("Failed to serialize notification preferences: {}", e))?;
    self.store.set(keys::NOTIFICATION_PREFERENCES, &blob)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryKvStore;

  fn prefs() -> (Arc<MemoryKvStore>, Preferences) {
    let store = Arc::new(MemoryKvStore::new());
    (store.clone(), Preferences::new(store))
  }

  #[test]
  fn test_defaults() {
    let (_, prefs) = prefs();
    assert_eq!(prefs.theme().unwrap(), Theme::System);
    assert_eq!(prefs.language().unwrap(), Language::Es);
    assert_eq!(
      prefs.notifications().unwrap(),
      NotificationPreferences::default()
    );
  }

  #[test]
  fn test_theme_and_language_persist() {
    let (store, prefs) = prefs();
    prefs.set_theme(Theme::Dark).unwrap();
    prefs.set_language(Language::En).unwrap();

    assert_eq!(store.get("userTheme").unwrap().as_deref(), Some("dark"));
    assert_eq!(store.get("userLanguage").unwrap().as_deref(), Some("en"));
    assert_eq!(prefs.theme().unwrap(), Theme::Dark);
  }

  #[test]
  fn test_corrupt_values_fall_back() {
    let (store, prefs) = prefs();
    store.set("userTheme", "neon").unwrap();
    store
      .set("notificationPreferences", "{not json")
      .unwrap();

    assert_eq!(prefs.theme().unwrap(), Theme::System);
    assert_eq!(
      prefs.notifications().unwrap(),
      NotificationPreferences::default()
    );
  }

  #[test]
  fn test_notification_blob_roundtrip() {
    let (_, prefs) = prefs();
    let wanted = NotificationPreferences {
      promotions: true,
      statements: false,
      ..Default::default()
    };
    prefs.set_notifications(&wanted).unwrap();
    assert_eq!(prefs.notifications().unwrap(), wanted);
  }

  #[test]
  fn test_parse_theme() {
    assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
    assert!("purple".parse::<Theme>().is_err());
  }
}
