//! Error types for meta cache operations.
//!
//! Table mutations (`apply_mod`, `revert_mod`) never fail with an error; they
//! report rejection through `bool`/`Option` returns. Everything that touches file
//! contents (synthesis, file accessors, default providers) and everything that
//! reads configuration from disk returns [`Result<T>`], which uses [`Error`].

use crate::files::MetaIndex;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while synthesizing or loading meta files.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading default files, manifests, config).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON (config, mod definitions, manifests).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The default-file provider has no baseline content for a file group.
    #[error("Default file not available: {0}")]
    MissingDefaultFile(MetaIndex),

    /// A default file is too short or internally inconsistent for its format.
    #[error("Malformed meta file {index}: {reason}")]
    MalformedFile { index: MetaIndex, reason: String },

    /// Reserving the output buffer for a synthesized file failed.
    #[error("Could not allocate {bytes} bytes for meta file {index}")]
    Allocation { index: MetaIndex, bytes: usize },

    /// The cache configuration is unusable.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Catch-all for errors from providers and other sources.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl Error {
    pub(crate) fn malformed(index: MetaIndex, reason: impl Into<String>) -> Self {
        Error::MalformedFile {
            index,
            reason: reason.into(),
        }
    }
}
