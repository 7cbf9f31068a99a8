use thiserror::Error;

/// Main error type for the feed client
#[derive(Error, Debug)]
pub enum FeedError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Channel identifier outside the closed registry set
    #[error("unknown feed channel: {0}")]
    UnknownChannel(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for feed client operations
pub type Result<T> = std::result::Result<T, FeedError>;
