//! Client-side list caching with pagination and staleness gating.
//!
//! This module provides one caching mechanism shared by every paginated list:
//! - Holds the last good page, the active filters and a fetch timestamp
//! - Decides lazily whether the active query needs a fetch (key + TTL)
//! - Guards against duplicate and superseded in-flight fetches
//! - Keeps stale data on display when a refresh fails
//! - Optionally persists pages for offline warm starts

mod feed;
mod filters;
mod list;
mod page;
mod snapshot;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use feed::Feed;
pub use filters::{filter_key, FilterError, ListFilters};
pub use list::{FetchOutcome, FetchRequest, FetchTicket, ListCache};
pub use page::{CachedPage, MergeMode};
pub use snapshot::SnapshotStore;
pub use traits::{CacheSource, Cacheable};
