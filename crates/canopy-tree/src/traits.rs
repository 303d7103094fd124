//! The capability surfaces consumed by diff and apply.

use canopy_types::{DirEntry, ObjectId, TreePath};

use crate::error::TreeResult;

/// Read access to one side of a comparison.
pub trait TreeReader: Send + Sync {
    /// List the entries of the directory at `path`, sorted by name.
    ///
    /// Returns `TreeError::NotFound` if the path does not exist and
    /// `TreeError::NotADirectory` if it names a file.
    fn list(&self, path: &TreePath) -> TreeResult<Vec<DirEntry>>;

    /// Like [`TreeReader::list`], but entries whose name fails `keep` are
    /// dropped before any per-entry work, such as fingerprinting, is done.
    fn list_filtered(
        &self,
        path: &TreePath,
        keep: &dyn Fn(&str) -> bool,
    ) -> TreeResult<Vec<DirEntry>> {
        let mut entries = self.list(path)?;
        entries.retain(|entry| keep(&entry.name));
        Ok(entries)
    }

    /// Read the full content of the file at `path`.
    fn read(&self, path: &TreePath) -> TreeResult<Vec<u8>>;
}

/// Options accepted by every target mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationOptions {
    /// Publish a new version immediately after the mutation.
    pub commit: bool,
}

impl MutationOptions {
    /// Stage the mutation without publishing.
    pub const STAGE: Self = Self { commit: false };
    /// Stage the mutation and publish it as a new version.
    pub const COMMIT: Self = Self { commit: true };
}

/// Mutation surface of a versioned target tree.
///
/// Mutations issued with [`MutationOptions::STAGE`] accumulate in a working
/// state that is invisible through [`TargetTree::version`] until
/// [`TargetTree::commit`] publishes them as one new version. Reads and
/// listings observe the working state.
pub trait TargetTree: TreeReader {
    /// Create or overwrite the file at `path`, creating missing parents.
    fn write(&self, path: &TreePath, bytes: &[u8], options: MutationOptions) -> TreeResult<()>;

    /// Create the directory at `path` and any missing parents. An existing
    /// directory is left untouched.
    fn make_directory(&self, path: &TreePath, options: MutationOptions) -> TreeResult<()>;

    /// Remove the file or directory at `path`, recursively.
    fn remove_path(&self, path: &TreePath, options: MutationOptions) -> TreeResult<()>;

    /// Publish staged mutations and return the current version. Returns the
    /// existing version when nothing is staged.
    fn commit(&self, message: &str) -> TreeResult<ObjectId>;

    /// Drop staged mutations.
    fn discard(&self) -> TreeResult<()>;

    /// The current published, immutable version identifier.
    fn version(&self) -> ObjectId;
}
