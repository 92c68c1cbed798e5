//! Error types for directory loading and directory operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Failure to bring the directory up at startup.
///
/// Every variant is fatal: the process must not serve without a fully loaded
/// directory.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Dataset file could not be opened or read (includes gzip stream errors).
    #[error("unable to read users file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Decompressed content is not a JSON array of user records.
    #[error("unable to decode users file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Content decoded but violates a directory invariant.
    #[error("malformed users file: {0}")]
    Malformed(String),
}

impl LoadError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Recoverable errors returned by directory lookups, allocation and mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No record matches the lookup key.
    #[error("user not found: {0}")]
    NotFound(String),

    /// A create or update would break uniqueness of an index.
    #[error("{0}")]
    Conflict(String),

    /// Unconstrained allocation ran out of unclaimed, selectable records.
    #[error("only {available} unclaimed selectable users available, {requested} requested")]
    Exhausted { requested: usize, available: usize },
}

impl DirectoryError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
