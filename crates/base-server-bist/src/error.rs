//! Error types for the self test.
//!
//! Failed requests are not errors: they are recorded in the report as
//! failed results. [`BistError`] covers only the cases where no report
//! can be produced or stored.

use std::path::PathBuf;

/// Errors that can occur while running or persisting the self test.
#[derive(Debug, thiserror::Error)]
pub enum BistError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Reading or writing the report file failed.
    #[error("report I/O error at {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The report could not be encoded or decoded.
    #[error("report serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
