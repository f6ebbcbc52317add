use std::io;

use logship_sink::Endpoint;
use logship_spool::SpoolError;
use thiserror::Error;

/// Errors surfaced from the driver's start/stop entry points.
///
/// Everything past a successful start is handled inside the pipeline and
/// logged rather than surfaced.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A log option key we do not recognize.
    #[error("unknown log option '{key}'")]
    UnknownOption { key: String },

    /// A required log option was not supplied.
    #[error("missing required log option '{key}'")]
    MissingOption { key: &'static str },

    /// A log option value failed validation.
    #[error("invalid log option '{key}': {message}")]
    InvalidOption { key: &'static str, message: String },

    /// A stream is already registered for this pipe.
    #[error("log stream for '{pipe}' already exists")]
    AlreadyExists { pipe: String },

    /// The requested sink settings conflict with the active shared sink.
    #[error("log options conflict with the active sink at {active}")]
    ConfigConflict { active: Endpoint },

    /// The log FIFO could not be opened.
    #[error("failed to open log fifo '{path}': {source}")]
    FifoOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The spool file could not be opened.
    #[error(transparent)]
    SpoolOpen(#[from] SpoolError),
}
