//! The club's paginated lists, all backed by the same cache component.

use chrono::Duration;

use super::client::ClubClient;
use super::filters::{EventFilters, FileFilters, NotificationFilters};
use super::types::{Event, FileEntry, Notification};
use crate::cache::{FetchOutcome, Feed, ListCache, MergeMode, SnapshotStore};
use crate::config::CacheConfig;

pub type EventsFeed = Feed<EventFilters, Event>;
pub type NotificationsFeed = Feed<NotificationFilters, Notification>;
pub type FilesFeed = Feed<FileFilters, FileEntry>;

/// Per-session list state, passed to whatever renders it.
#[derive(Clone)]
pub struct ClubFeeds {
  pub events: EventsFeed,
  pub notifications: NotificationsFeed,
  pub files: FilesFeed,
}

impl ClubFeeds {
  pub fn new(config: &CacheConfig, snapshots: Option<SnapshotStore>) -> Self {
    let events = ListCache::new(config.page_size).with_ttl(ttl(config.events_ttl_secs));
    let notifications =
      ListCache::new(config.page_size).with_ttl(ttl(config.notifications_ttl_secs));
    let files = ListCache::new(config.page_size)
      .with_ttl(ttl(config.files_ttl_secs))
      .with_mode(MergeMode::Append);

    let mut feeds = Self {
      events: Feed::new(events),
      notifications: Feed::new(notifications),
      files: Feed::new(files),
    };
    if let Some(snapshots) = snapshots {
      feeds.events = feeds.events.with_snapshots(snapshots.clone());
      feeds.notifications = feeds.notifications.with_snapshots(snapshots.clone());
      feeds.files = feeds.files.with_snapshots(snapshots);
    }
    feeds
  }

  /// Show persisted pages for the active queries before the network answers.
  pub fn restore_snapshots(&self) {
    self.events.restore_snapshot();
    self.notifications.restore_snapshot();
    self.files.restore_snapshot();
  }

  pub async fn load_events(&self, client: &ClubClient, force: bool) -> FetchOutcome {
    if force {
      self.events.refresh(|req| client.list_events(req)).await
    } else {
      self.events.load(|req| client.list_events(req)).await
    }
  }

  pub async fn load_notifications(&self, client: &ClubClient, force: bool) -> FetchOutcome {
    if force {
      self
        .notifications
        .refresh(|req| client.list_notifications(req))
        .await
    } else {
      self
        .notifications
        .load(|req| client.list_notifications(req))
        .await
    }
  }

  pub async fn load_files(&self, client: &ClubClient, force: bool) -> FetchOutcome {
    if force {
      self.files.refresh(|req| client.list_files(req)).await
    } else {
      self.files.load(|req| client.list_files(req)).await
    }
  }
}

/// Zero disables expiry: the page stays valid until the query changes.
fn ttl(secs: u64) -> Option<Duration> {
  (secs > 0).then(|| Duration::seconds(secs as i64))
}
