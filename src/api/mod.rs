//! Remote resource gateway for the club backend.
//!
//! Wraps authenticated HTTP calls and turns every outcome into one of:
//! - decoded `data` on success
//! - a business error carrying the server's message and recovery action
//! - `Unauthorized` after clearing the stored session
//! - `Offline` when the server could not be reached
//!
//! No call is ever retried automatically.

mod envelope;
mod error;
mod gateway;

#[cfg(test)]
pub(crate) mod testing;

pub use envelope::{ErrorEnvelope, Page, Pagination, RecoveryAction};
pub use error::{fallback_message, ApiError};
pub use gateway::{ApiRequest, ApiResponse, Auth, Gateway, UnauthorizedHandler};
