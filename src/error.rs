use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A required field was missing before join/send/upload; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("no connection to the chat service")]
    TransportUnavailable,

    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Protocol(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The room context changed while the request was in flight.
    #[error("response arrived for a room that is no longer active")]
    Stale,
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
