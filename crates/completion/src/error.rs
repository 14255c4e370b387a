//! Completion errors.

use std::time::Duration;

/// Everything that can go wrong while asking the endpoint for a completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The request never produced an HTTP response (DNS, connect, I/O).
    #[error("completion request failed: {0}")]
    Transport(String),

    /// No complete response arrived within the configured timeout.
    #[error("completion endpoint did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// The endpoint answered 2xx but the body has no usable first choice.
    #[error("malformed completion reply: {0}")]
    MalformedReply(String),
}
