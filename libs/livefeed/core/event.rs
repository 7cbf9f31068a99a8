use crate::core::channel::FeedChannel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame discriminator carried in the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedEventKind {
    Transaction,
    Validator,
    Consensus,
    Network,
    Metric,
    Channel,
    Error,
    Connected,
    Disconnected,
    /// A `type` value this client does not know. Kept instead of failing the
    /// parse so a newer backend never makes frames look malformed.
    #[serde(other)]
    Unknown,
}

/// Wire envelope for inbound frames, one JSON object per frame.
///
/// `channel` may name a different logical channel than the socket the frame
/// arrived on; the unified live stream relies on this to carry events for
/// the other channels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: FeedEventKind,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Event delivered to channel listeners.
///
/// A normalized projection of [`InboundMessage`], plus the synthetic
/// `connected`/`disconnected` lifecycle events the connection manager emits
/// on its own state transitions.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEvent {
    pub channel: FeedChannel,
    #[serde(rename = "type")]
    pub kind: FeedEventKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl FeedEvent {
    pub(crate) fn from_inbound(channel: FeedChannel, message: InboundMessage) -> Self {
        Self {
            channel,
            kind: message.kind,
            data: message.data,
            timestamp: message.timestamp,
        }
    }

    pub(crate) fn connected(channel: FeedChannel) -> Self {
        Self {
            channel,
            kind: FeedEventKind::Connected,
            data: Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn disconnected(channel: FeedChannel) -> Self {
        Self {
            channel,
            kind: FeedEventKind::Disconnected,
            data: Value::Null,
            timestamp: Utc::now(),
        }
    }
}
