//! Tail one or more dashboard feed channels to stdout.
//!
//! Connects to the feed gateway and prints every event delivered on the
//! requested channels. Useful for eyeballing what the gateway is pushing
//! without spinning up the dashboard.
//!
//! Usage:
//!   cargo run --bin feed_tail -- transactions validators
//!   cargo run --bin feed_tail            # defaults to the unified live stream
//!
//! Environment variables (all optional):
//!   FEED_WS_URL                 - gateway base URL (default ws://127.0.0.1:9050)
//!   FEED_RECONNECT_INTERVAL_MS  - base reconnect delay in ms (default 3000)
//!   FEED_MAX_RECONNECT_ATTEMPTS - reconnect ceiling per channel (default 10)

use anyhow::Result;
use livefeed::{FeedChannel, FeedConfig, FeedManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let channels = parse_channels()?;

    let config = FeedConfig::from_env()?;
    println!("Connecting to {}", config.base_url);
    let manager = FeedManager::new(config);

    let mut subscriptions = Vec::with_capacity(channels.len());
    for channel in &channels {
        println!("Tailing channel: {}", channel);
        subscriptions.push(manager.subscribe(*channel, |event| {
            println!(
                "[{}] {} {:?}: {}",
                event.timestamp.format("%H:%M:%S%.3f"),
                event.channel,
                event.kind,
                event.data
            );
        }));
    }

    println!("Press Ctrl+C to stop\n");
    tokio::signal::ctrl_c().await?;

    for subscription in subscriptions {
        subscription.unsubscribe();
    }
    manager.disconnect_all();

    println!("Shutdown complete");
    Ok(())
}

fn parse_channels() -> Result<Vec<FeedChannel>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return Ok(vec![FeedChannel::LiveStream]);
    }

    args.iter()
        .map(|arg| {
            arg.parse::<FeedChannel>()
                .map_err(|e| anyhow::anyhow!("{} (valid channels: {:?})", e, FeedChannel::ALL))
        })
        .collect()
}
