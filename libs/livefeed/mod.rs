//! # LiveFeed
//!
//! Multi-channel WebSocket client for the dashboard's real-time views.
//!
//! Each logical feed channel (transactions, validators, consensus, network,
//! metrics, channels, unified live stream) gets its own socket, its own
//! lifecycle state and its own bounded-backoff reconnect schedule. Inbound
//! frames are parsed once and fanned out synchronously to every listener
//! subscribed to the channel named in the payload.
//!
//! ## Features
//!
//! - **One socket per channel**: idempotent `connect`, atomic state claims
//! - **Auto-connect on subscribe**: the first listener opens the channel
//! - **Bounded exponential backoff**: reconnects only while listeners remain
//! - **Fault isolation**: a malformed frame or a panicking listener never
//!   takes a connection down
//!
//! ## Example
//!
//! ```rust,ignore
//! use livefeed::{FeedChannel, FeedConfig, FeedManager};
//!
//! #[tokio::main]
//! async fn main() -> livefeed::Result<()> {
//!     let manager = FeedManager::new(FeedConfig::from_env()?);
//!
//!     let subscription = manager.subscribe(FeedChannel::Metrics, |event| {
//!         println!("{}: {}", event.channel, event.data);
//!     });
//!
//!     // ... later
//!     subscription.unsubscribe();
//!     manager.disconnect_all();
//!     Ok(())
//! }
//! ```

pub mod traits;
pub mod core;
pub mod manager;

// Re-export all traits
pub use traits::*;

// Re-export core types
pub use core::{
    channel::FeedChannel,
    config::FeedConfig,
    connection_state::{AtomicConnectionState, ChannelMetrics, ConnectionState, FeedMetrics},
    event::{FeedEvent, FeedEventKind, InboundMessage},
    listeners::{Listener, ListenerDirectory},
};

// Re-export manager
pub use manager::{FeedManager, Subscription};
