// Error handling for Whisper Relay
//
// This module defines the remote-call error type shared by the publisher and
// the job client, and the top-level error surfaced by the orchestration flow.

use thiserror::Error;

use crate::config::ConfigError;
use crate::publisher::PublishError;

/// Errors raised by calls to remote HTTP endpoints
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The endpoint answered with a non-success HTTP status
    #[error("Remote endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected JSON shape
    #[error("Malformed response payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The configured poll cap was reached before the job completed
    #[error("Job did not complete within {0} status polls")]
    PollBudgetExhausted(u64),
}

/// Top-level error for one relay flow
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The local file could not be published
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// The remote queue rejected or failed a call
    #[error("Remote API error: {0}")]
    Remote(#[from] RemoteError),
}
