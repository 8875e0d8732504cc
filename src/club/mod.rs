//! Club membership features on top of the gateway and list cache.

pub mod availability;
pub mod client;
pub mod feeds;
pub mod filters;
pub mod types;

pub use availability::{compute_slots, TimeSlot};
pub use client::ClubClient;
pub use feeds::{ClubFeeds, EventsFeed, FilesFeed, NotificationsFeed};
pub use filters::{EventCategory, EventFilters, FileFilters, FileSort, NotificationFilters};
