use std::io;

use thiserror::Error;

/// Errors from the sink client.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Endpoint URL failed validation.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connecting to the endpoint failed.
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// A write on the established connection failed.
    #[error("write failed: {0}")]
    Write(#[from] io::Error),

    /// Connect or write did not finish within the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// No connection while a background reconnect is in progress.
    #[error("endpoint unreachable, reconnect in progress")]
    Reconnecting,

    /// The client was closed.
    #[error("client is closed")]
    Closed,
}

impl SinkError {
    pub(crate) fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::InvalidEndpoint(message.into())
    }
}
