use crate::traits::FeedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical real-time feed channels exposed by the dashboard gateway.
///
/// The set is closed and known at compile time, so the registry lookup is
/// total: a channel outside the set is unrepresentable rather than a runtime
/// condition to recover from. The wire identifier (envelope `channel` field)
/// is the lowercase variant name, except for the unified stream which goes
/// by `live`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedChannel {
    Transactions,
    Validators,
    Consensus,
    Network,
    Metrics,
    Channels,
    /// Unified endpoint aggregating every other channel over one socket.
    #[serde(rename = "live")]
    LiveStream,
}

impl FeedChannel {
    /// Every channel, in registry order.
    pub const ALL: [FeedChannel; 7] = [
        FeedChannel::Transactions,
        FeedChannel::Validators,
        FeedChannel::Consensus,
        FeedChannel::Network,
        FeedChannel::Metrics,
        FeedChannel::Channels,
        FeedChannel::LiveStream,
    ];

    /// Wire identifier used in the message envelope's `channel` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedChannel::Transactions => "transactions",
            FeedChannel::Validators => "validators",
            FeedChannel::Consensus => "consensus",
            FeedChannel::Network => "network",
            FeedChannel::Metrics => "metrics",
            FeedChannel::Channels => "channels",
            FeedChannel::LiveStream => "live",
        }
    }

    /// Endpoint path the channel's socket connects to, relative to the
    /// gateway base URL.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            FeedChannel::Transactions => "/ws/transactions",
            FeedChannel::Validators => "/ws/validators",
            FeedChannel::Consensus => "/ws/consensus",
            FeedChannel::Network => "/ws/network",
            FeedChannel::Metrics => "/ws/metrics",
            FeedChannel::Channels => "/ws/channels",
            FeedChannel::LiveStream => "/ws/live",
        }
    }

    /// Dense index for per-channel slot arrays.
    pub(crate) const fn index(self) -> usize {
        match self {
            FeedChannel::Transactions => 0,
            FeedChannel::Validators => 1,
            FeedChannel::Consensus => 2,
            FeedChannel::Network => 3,
            FeedChannel::Metrics => 4,
            FeedChannel::Channels => 5,
            FeedChannel::LiveStream => 6,
        }
    }
}

impl fmt::Display for FeedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedChannel {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedChannel::ALL
            .iter()
            .find(|channel| channel.as_str() == s)
            .copied()
            .ok_or_else(|| FeedError::UnknownChannel(s.to_string()))
    }
}
