use canopy_tree::TreeError;
use canopy_types::{ObjectId, TreePath};
use thiserror::Error;

/// Errors that abort an apply. Each carries the version that is still
/// current on the target, since nothing of the failed batch was published.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot read local {path}: {source} (version {current} is still current)")]
    Read {
        path: TreePath,
        current: ObjectId,
        #[source]
        source: TreeError,
    },

    #[error("cannot write {path}: {source} (version {current} is still current)")]
    Write {
        path: TreePath,
        current: ObjectId,
        #[source]
        source: TreeError,
    },

    #[error("cannot create directory {path}: {source} (version {current} is still current)")]
    MakeDirectory {
        path: TreePath,
        current: ObjectId,
        #[source]
        source: TreeError,
    },

    #[error("cannot remove {path}: {source} (version {current} is still current)")]
    Remove {
        path: TreePath,
        current: ObjectId,
        #[source]
        source: TreeError,
    },

    #[error("commit failed: {source} (version {current} is still current)")]
    Commit {
        current: ObjectId,
        #[source]
        source: TreeError,
    },

    #[error("apply cancelled (version {current} is still current)")]
    Cancelled { current: ObjectId },
}

impl SyncError {
    /// The published version at the time of the failure.
    pub fn current_version(&self) -> ObjectId {
        match self {
            Self::Read { current, .. }
            | Self::Write { current, .. }
            | Self::MakeDirectory { current, .. }
            | Self::Remove { current, .. }
            | Self::Commit { current, .. }
            | Self::Cancelled { current } => *current,
        }
    }

    /// The path of the failed read or mutation, if any.
    pub fn path(&self) -> Option<&TreePath> {
        match self {
            Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::MakeDirectory { path, .. }
            | Self::Remove { path, .. } => Some(path),
            Self::Commit { .. } | Self::Cancelled { .. } => None,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
