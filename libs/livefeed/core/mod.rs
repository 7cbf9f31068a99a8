//! Core building blocks of the feed client.
//!
//! Leaves first: the channel registry, the per-channel connection state
//! store, the wire envelope types, the listener directory and the
//! environment-driven configuration. The [`crate::manager`] module wires
//! them together.

pub mod channel;
pub mod config;
pub mod connection_state;
pub mod event;
pub mod listeners;

pub use channel::FeedChannel;
pub use config::FeedConfig;
pub use connection_state::{AtomicConnectionState, ChannelMetrics, ConnectionState, FeedMetrics};
pub use event::{FeedEvent, FeedEventKind, InboundMessage};
pub use listeners::{Listener, ListenerDirectory};
