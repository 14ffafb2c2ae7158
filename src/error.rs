//! Crate-level error types.
//!
//! [`TormentusError`] unifies every error source (configuration, feed
//! socket, REST calls, JSON, keychain) behind a single enum so callers can
//! match on the variant they care about while still using the `?`
//! operator for easy propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TormentusError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum TormentusError {
    /// Configuration from the environment is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An HTTP request to the REST API could not be completed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST API answered with a non-success status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The trade form failed local validation.
    #[error("{0}")]
    Validation(String),

    /// A feed or API payload did not have the expected shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Terminal or file I/O failed.
    #[error("io error: {0}")]
    Io(String),

    /// The OS keychain could not be read or written.
    #[error("keychain error: {0}")]
    Keyring(String),
}

impl TormentusError {
    /// Text to show the user: the server or validation message when there
    /// is one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            TormentusError::Api { message, .. } | TormentusError::Validation(message) => {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }
}
