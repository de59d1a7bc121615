//! Error types for the cellular client.

/// Result type alias using the client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while negotiating or driving a session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signaling endpoint error (unreachable, non-2xx, malformed body)
    #[error("Signaling error: {0}")]
    SignalingError(String),

    /// SDP offer/answer error
    #[error("SDP negotiation error: {0}")]
    SdpError(String),

    /// Data channel error
    #[error("Data channel error: {0}")]
    DataChannelError(String),

    /// Operation attempted in the wrong session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed control-channel frame
    #[error("Protocol error: {0}")]
    ProtocolError(#[from] serde_json::Error),

    /// Signaling HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// WebRTC library error
    #[error("WebRTC error: {0}")]
    WebRtcError(String),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// Check if this error terminated a negotiation attempt.
    ///
    /// All of these are fatal for the session: the client never retries a
    /// failed negotiation, a fresh start is required.
    pub fn is_negotiation_error(&self) -> bool {
        matches!(
            self,
            Error::SignalingError(_)
                | Error::SdpError(_)
                | Error::HttpError(_)
                | Error::WebRtcError(_)
        )
    }
}
