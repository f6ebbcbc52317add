use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from the on-disk spool.
#[derive(Debug, Error)]
pub enum SpoolError {
    /// Spool directory could not be created.
    #[error("failed to create spool directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Spool file could not be opened.
    #[error("failed to open spool file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing a record failed.
    #[error("spool write failed: {0}")]
    Write(#[from] io::Error),

    /// The spool was closed.
    #[error("spool is closed")]
    Closed,
}
