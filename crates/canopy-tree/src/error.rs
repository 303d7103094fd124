//! Error types for tree access.

use std::io;

use canopy_types::TreePath;
use thiserror::Error;

/// Errors raised while listing, reading, or mutating a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The path does not exist.
    #[error("{path}: not found")]
    NotFound { path: TreePath },

    /// The path exists but may not be read.
    #[error("{path}: access denied")]
    AccessDenied { path: TreePath },

    /// A directory operation hit a file.
    #[error("{path}: not a directory")]
    NotADirectory { path: TreePath },

    /// A file operation hit a directory.
    #[error("{path}: is a directory")]
    IsADirectory { path: TreePath },

    /// A directory cannot be created where a file already exists.
    #[error("{path}: already exists")]
    AlreadyExists { path: TreePath },

    /// The operation is not valid for this path (e.g. removing the root).
    #[error("{path}: {reason}")]
    InvalidPath { path: TreePath, reason: String },

    /// Underlying filesystem failure.
    #[error("{path}: {source}")]
    Io {
        path: TreePath,
        #[source]
        source: io::Error,
    },

    /// Object store failure on the target side.
    #[error("store error: {0}")]
    Store(#[from] canopy_store::StoreError),
}

impl TreeError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: &TreePath, source: io::Error) -> Self {
        let path = path.clone();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            _ => Self::Io { path, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
