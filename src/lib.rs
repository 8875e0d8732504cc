//! Client core for a private club's membership services.
//!
//! - [`api`]: authenticated gateway to the club backend
//! - [`cache`]: paginated list cache with staleness gating
//! - [`store`]: on-device persistent state
//! - [`club`]: typed endpoints, feeds and reservation availability

pub mod api;
pub mod cache;
pub mod club;
pub mod config;
pub mod logging;
pub mod store;
