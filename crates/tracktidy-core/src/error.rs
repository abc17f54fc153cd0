//! Error types for rename operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a rename job before or during orchestration.
///
/// Per-file failures are not represented here; they are captured as data
/// on the file's result so the rest of the batch continues.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The job's root path does not exist.
    #[error("Root path not found: {path}")]
    RootNotFound { path: PathBuf },

    /// The job's root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The naming template is empty or renders to nothing useful.
    #[error("Naming template is empty")]
    EmptyTemplate,

    /// The job configuration is invalid.
    #[error("Invalid job: {message}")]
    InvalidJob { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl RenameError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::RootNotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a generic error from a message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
