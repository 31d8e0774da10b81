//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scan was cancelled through its cancellation token.
    #[error("Scan cancelled")]
    Cancelled,

    /// A scan is already running on this coordinator.
    #[error("A scan is already running")]
    AlreadyRunning,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// What the traverser was doing when an entry failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalErrorKind {
    /// Listing a directory failed.
    ListDir,
    /// Reading an entry's metadata failed.
    Metadata,
}

/// A non-fatal traversal failure; the path is skipped.
#[derive(Debug, Error)]
#[error("Cannot read {path}: {source}")]
pub struct TraversalError {
    /// Path that could not be read.
    pub path: PathBuf,
    /// Operation that failed.
    pub kind: TraversalErrorKind,
    #[source]
    pub source: std::io::Error,
}

impl TraversalError {
    /// Create a traversal error.
    pub fn new(path: impl Into<PathBuf>, kind: TraversalErrorKind, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            kind,
            source,
        }
    }

    /// Whether the failure was a permission problem.
    pub fn is_permission_denied(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::PermissionDenied
    }
}

/// A file could not be read while hashing; it is dropped from duplicate
/// detection.
#[derive(Debug, Error)]
pub enum HashError {
    /// Reading the file failed.
    #[error("Cannot hash {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file yielded no bytes although it was listed with a size.
    #[error("File is empty: {path}")]
    Empty { path: PathBuf },

    /// Hashing was skipped because the scan was cancelled.
    #[error("Hashing cancelled")]
    Cancelled,
}

impl HashError {
    /// Create an I/O hash error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
