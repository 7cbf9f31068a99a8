//! ChainScope - Enterprise Blockchain Dashboard
//!
//! This crate is the top-level entry point for the ChainScope tooling.
//! The real work happens in the workspace libraries; this crate re-exports
//! them and hosts the operational binaries.
//!
//! - **livefeed**: multi-channel WebSocket data feed client
//!
//! ## Usage in Binaries
//!
//! ```rust,no_run
//! use chainscope::livefeed::{FeedChannel, FeedConfig, FeedManager};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let manager = FeedManager::new(FeedConfig::from_env()?);
//! let _sub = manager.subscribe(FeedChannel::LiveStream, |event| {
//!     println!("{}: {}", event.channel, event.data);
//! });
//! # Ok(())
//! # }
//! ```

// Re-export workspace libraries for convenience
pub use livefeed;
