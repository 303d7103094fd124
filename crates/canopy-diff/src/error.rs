//! Error types for the diff crate.

use std::fmt;

use canopy_tree::TreeError;
use canopy_types::{EntryKind, TreePath};

/// Which tree of a comparison an error came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Local,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Errors that abort a diff.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A directory could not be enumerated.
    #[error("cannot list {side} {path}: {source}")]
    Listing {
        side: Side,
        path: TreePath,
        #[source]
        source: TreeError,
    },

    /// An ignore file exists but could not be read.
    #[error("cannot read ignore file {path}: {source}")]
    IgnoreFile {
        path: TreePath,
        #[source]
        source: TreeError,
    },

    /// The same name is a different entry type on each side and the policy
    /// forbids replacing it.
    #[error("{path}: {old} on target but {new} locally")]
    TypeConflict {
        path: TreePath,
        old: EntryKind,
        new: EntryKind,
    },

    #[error("diff cancelled")]
    Cancelled,
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
