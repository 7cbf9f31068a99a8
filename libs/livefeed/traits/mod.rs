//! Core traits and types for the LiveFeed client.
//!
//! - **ReconnectionStrategy**: control backoff between reconnect attempts
//! - **FeedError**: the crate-wide error taxonomy

pub mod error;
pub mod reconnect;

pub use error::{FeedError, Result};
pub use reconnect::{ExponentialBackoff, FixedDelay, ReconnectionStrategy, BACKOFF_CAP_FACTOR};
