use std::fmt;

use canopy_tree::{MutationOptions, TargetTree, TreeError, TreeResult};
use canopy_types::{ObjectId, TreePath};

use crate::error::SyncError;

/// One change issued against the target tree while applying a delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    WriteFile { path: TreePath, bytes: Vec<u8> },
    MakeDirectory { path: TreePath },
    /// Recursive for directories.
    RemovePath { path: TreePath },
}

impl Mutation {
    pub fn path(&self) -> &TreePath {
        match self {
            Self::WriteFile { path, .. }
            | Self::MakeDirectory { path }
            | Self::RemovePath { path } => path,
        }
    }

    pub fn apply(&self, target: &dyn TargetTree, options: MutationOptions) -> TreeResult<()> {
        match self {
            Self::WriteFile { path, bytes } => target.write(path, bytes, options),
            Self::MakeDirectory { path } => target.make_directory(path, options),
            Self::RemovePath { path } => target.remove_path(path, options),
        }
    }

    pub(crate) fn failed(&self, source: TreeError, current: ObjectId) -> SyncError {
        let path = self.path().clone();
        match self {
            Self::WriteFile { .. } => SyncError::Write {
                path,
                current,
                source,
            },
            Self::MakeDirectory { .. } => SyncError::MakeDirectory {
                path,
                current,
                source,
            },
            Self::RemovePath { .. } => SyncError::Remove {
                path,
                current,
                source,
            },
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFile { path, bytes } => write!(f, "write {path} ({} bytes)", bytes.len()),
            Self::MakeDirectory { path } => write!(f, "mkdir {path}"),
            Self::RemovePath { path } => write!(f, "remove {path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_path() {
        let path = TreePath::parse("public/a.txt").unwrap();
        let write = Mutation::WriteFile {
            path: path.clone(),
            bytes: b"abc".to_vec(),
        };
        assert_eq!(write.to_string(), "write public/a.txt (3 bytes)");
        assert_eq!(Mutation::RemovePath { path }.to_string(), "remove public/a.txt");
    }

    #[test]
    fn failures_map_to_matching_errors() {
        let path = TreePath::parse("d").unwrap();
        let current = ObjectId::null();
        let err = Mutation::MakeDirectory { path: path.clone() }
            .failed(TreeError::AlreadyExists { path: path.clone() }, current);
        assert!(matches!(err, SyncError::MakeDirectory { .. }));
        assert_eq!(err.path(), Some(&path));
        assert_eq!(err.current_version(), current);
    }
}
