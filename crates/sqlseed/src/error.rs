//! Error types for seeding runs

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for seeding operations
pub type Result<T> = std::result::Result<T, SeedError>;

/// Everything that can stop a seeding run.
///
/// Each variant that originates in a node carries the source path of that
/// node so the caller can tell which dataset failed.
#[derive(Error, Debug)]
pub enum SeedError {
    /// The source could not be opened: missing, unreadable or not gzip
    #[error("failed to open source '{}': {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O or decompression failure mid-stream, including the line count pre-scan
    #[error("failed to read lines from '{}': {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The line handler rejected a line
    #[error("failed to handle line {line} of '{}': {source}", path.display())]
    HandlerFailed {
        path: PathBuf,
        line: u64,
        #[source]
        source: anyhow::Error,
    },

    /// The store rejected or could not run a queued statement
    #[error("failed to execute batch for '{}': {source}", path.display())]
    ExecutionFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A spawned node task or blocking read panicked
    #[error("seeding task for '{}' did not complete: {message}", path.display())]
    TaskFailed { path: PathBuf, message: String },

    /// The run was cancelled by the caller before any node failed
    #[error("seeding run was cancelled")]
    Cancelled,
}

impl SeedError {
    pub(crate) fn open(path: &Path, source: std::io::Error) -> Self {
        SeedError::OpenFailed {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        SeedError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn task(path: &Path, err: tokio::task::JoinError) -> Self {
        SeedError::TaskFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Source path of the node the error came from, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            SeedError::OpenFailed { path, .. }
            | SeedError::ReadFailed { path, .. }
            | SeedError::HandlerFailed { path, .. }
            | SeedError::ExecutionFailed { path, .. }
            | SeedError::TaskFailed { path, .. } => Some(path),
            SeedError::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SeedError::Cancelled)
    }
}
