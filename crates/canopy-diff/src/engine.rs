//! The recursive tree diff.

use std::collections::BTreeMap;

use canopy_tree::TreeReader;
use canopy_types::{CancelToken, DirEntry, EntryKind, TreePath};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::delta::{Delta, DeltaKind};
use crate::error::{DiffError, DiffResult, Side};
use crate::ignore::{IgnoreFilter, DEFAULT_IGNORE_FILE};
use crate::walk::merge_sorted;

/// What to do when a name is a file on one side and a directory on the other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeConflictPolicy {
    /// Record a [`DeltaKind::Replaced`] node.
    #[default]
    Replace,
    /// Abort the diff with [`DiffError::TypeConflict`].
    Fail,
}

/// Options for [`diff`].
#[derive(Clone, Debug)]
pub struct DiffOptions {
    pub ignore_file: String,
    /// Names excluded at every level in addition to the ignore file.
    pub reserved: Vec<String>,
    pub type_conflict: TypeConflictPolicy,
    pub cancel: CancelToken,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            reserved: Vec::new(),
            type_conflict: TypeConflictPolicy::default(),
            cancel: CancelToken::new(),
        }
    }
}

impl DiffOptions {
    pub fn reserve(mut self, name: impl Into<String>) -> Self {
        self.reserved.push(name.into());
        self
    }

    pub fn type_conflict(mut self, policy: TypeConflictPolicy) -> Self {
        self.type_conflict = policy;
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }
}

/// Compare the target directory at `target_root` with the local directory
/// at `local_root`.
///
/// The returned root is always present and named `.`. A root that does not
/// exist on one side is treated as empty: the result is `Added` or `Removed`
/// as a whole. Any other listing failure aborts the diff.
pub fn diff(
    target_root: &TreePath,
    local_root: &TreePath,
    target: &dyn TreeReader,
    local: &dyn TreeReader,
    options: &DiffOptions,
) -> DiffResult<Delta> {
    let engine = Engine {
        target,
        local,
        options,
    };
    let filter = engine.filter(local_root)?;
    let target_entries = engine.list_root(Side::Target, target_root, &filter)?;
    let local_entries = engine.list_root(Side::Local, local_root, &filter)?;

    let delta = match (target_entries, local_entries) {
        (None, None) => Delta::rollup(".", BTreeMap::new()),
        (None, Some(local_entries)) => {
            let children = engine.compare(target_root, local_root, Vec::new(), local_entries)?;
            Delta::directory(DeltaKind::Added, ".", children)
        }
        (Some(target_entries), None) => {
            let children = engine.compare(target_root, local_root, target_entries, Vec::new())?;
            Delta::directory(DeltaKind::Removed, ".", children)
        }
        (Some(target_entries), Some(local_entries)) => {
            let children =
                engine.compare(target_root, local_root, target_entries, local_entries)?;
            Delta::rollup(".", children)
        }
    };
    debug!(target = %target_root, local = %local_root, kind = %delta.kind, "diff complete");
    Ok(delta)
}

struct Engine<'a> {
    target: &'a dyn TreeReader,
    local: &'a dyn TreeReader,
    options: &'a DiffOptions,
}

impl Engine<'_> {
    fn reader(&self, side: Side) -> &dyn TreeReader {
        match side {
            Side::Local => self.local,
            Side::Target => self.target,
        }
    }

    fn check_cancel(&self) -> DiffResult<()> {
        if self.options.cancel.is_cancelled() {
            return Err(DiffError::Cancelled);
        }
        Ok(())
    }

    /// List `path` on `side`, dropping excluded names before they are
    /// fingerprinted.
    fn list(
        &self,
        side: Side,
        path: &TreePath,
        filter: &IgnoreFilter,
    ) -> DiffResult<Vec<DirEntry>> {
        self.list_with(side, path, &|name| !filter.excluded(name))
    }

    fn list_with(
        &self,
        side: Side,
        path: &TreePath,
        keep: &dyn Fn(&str) -> bool,
    ) -> DiffResult<Vec<DirEntry>> {
        self.check_cancel()?;
        let entries = self
            .reader(side)
            .list_filtered(path, keep)
            .map_err(|source| DiffError::Listing {
                side,
                path: path.clone(),
                source,
            })?;
        debug!(%side, path = %path, entries = entries.len(), "listed");
        Ok(entries)
    }

    /// List a diff root; a root that does not exist lists as `None`.
    fn list_root(
        &self,
        side: Side,
        path: &TreePath,
        filter: &IgnoreFilter,
    ) -> DiffResult<Option<Vec<DirEntry>>> {
        match self.list(side, path, filter) {
            Ok(entries) => Ok(Some(entries)),
            Err(DiffError::Listing { source, .. }) if source.is_not_found() => {
                debug!(%side, path = %path, "root does not exist");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The filter for a local directory. When its ignore file cannot be read
    /// because the directory itself is unusable, the listing error is
    /// reported instead.
    fn filter(&self, local_dir: &TreePath) -> DiffResult<IgnoreFilter> {
        let options = self.options;
        IgnoreFilter::load(self.local, local_dir, &options.ignore_file, &options.reserved)
            .or_else(|err| {
                self.list_with(Side::Local, local_dir, &|_| false)?;
                Err(err)
            })
    }

    /// The filter for a directory that only exists on the target.
    fn reserved_only(&self) -> IgnoreFilter {
        IgnoreFilter::new(&self.options.ignore_file, &self.options.reserved)
    }

    /// Compare one directory level from already filtered listings. A side
    /// where the directory does not exist passes an empty listing. Returns
    /// only the differing children.
    fn compare(
        &self,
        target_dir: &TreePath,
        local_dir: &TreePath,
        target_entries: Vec<DirEntry>,
        local_entries: Vec<DirEntry>,
    ) -> DiffResult<BTreeMap<String, Delta>> {
        let mut children = BTreeMap::new();
        for pair in merge_sorted(target_entries, local_entries) {
            let target_path = target_dir.join(&pair.name);
            let local_path = local_dir.join(&pair.name);
            let delta = match (pair.left, pair.right) {
                (None, None) => continue,
                (None, Some(local)) => self.added(&target_path, &local_path, local)?,
                (Some(target), None) => self.removed(&target_path, &local_path, target)?,
                (Some(target), Some(local)) => {
                    self.both(&target_path, &local_path, target, local)?
                }
            };
            if !delta.is_unchanged() {
                children.insert(pair.name, delta);
            }
        }
        Ok(children)
    }

    /// Children of a directory that only exists locally.
    fn local_only(
        &self,
        target_path: &TreePath,
        local_path: &TreePath,
    ) -> DiffResult<BTreeMap<String, Delta>> {
        let filter = self.filter(local_path)?;
        let listing = self.list(Side::Local, local_path, &filter)?;
        self.compare(target_path, local_path, Vec::new(), listing)
    }

    fn added(
        &self,
        target_path: &TreePath,
        local_path: &TreePath,
        entry: DirEntry,
    ) -> DiffResult<Delta> {
        if !entry.is_dir() {
            return Ok(Delta::file(DeltaKind::Added, entry.name));
        }
        let children = self.local_only(target_path, local_path)?;
        Ok(Delta::directory(DeltaKind::Added, entry.name, children))
    }

    fn removed(
        &self,
        target_path: &TreePath,
        local_path: &TreePath,
        entry: DirEntry,
    ) -> DiffResult<Delta> {
        if !entry.is_dir() {
            return Ok(Delta::file(DeltaKind::Removed, entry.name));
        }
        let listing = self.list(Side::Target, target_path, &self.reserved_only())?;
        let children = self.compare(target_path, local_path, listing, Vec::new())?;
        Ok(Delta::directory(DeltaKind::Removed, entry.name, children))
    }

    fn both(
        &self,
        target_path: &TreePath,
        local_path: &TreePath,
        target: DirEntry,
        local: DirEntry,
    ) -> DiffResult<Delta> {
        match (target.kind, local.kind) {
            (EntryKind::Directory, EntryKind::Directory) => {
                let filter = self.filter(local_path)?;
                let target_listing = self.list(Side::Target, target_path, &filter)?;
                let local_listing = self.list(Side::Local, local_path, &filter)?;
                let children =
                    self.compare(target_path, local_path, target_listing, local_listing)?;
                Ok(Delta::rollup(local.name, children))
            }
            (EntryKind::File, EntryKind::File) => {
                let kind = if target.fingerprint == local.fingerprint {
                    DeltaKind::Unchanged
                } else {
                    DeltaKind::Changed
                };
                Ok(Delta::file(kind, local.name))
            }
            (old, new) => {
                if self.options.type_conflict == TypeConflictPolicy::Fail {
                    return Err(DiffError::TypeConflict {
                        path: local_path.clone(),
                        old,
                        new,
                    });
                }
                debug!(path = %local_path, %old, %new, "type conflict");
                let kind = DeltaKind::Replaced { old, new };
                if new.is_dir() {
                    let children = self.local_only(target_path, local_path)?;
                    Ok(Delta::directory(kind, local.name, children))
                } else {
                    Ok(Delta::file(kind, local.name))
                }
            }
        }
    }
}
