//! Content-addressed, versioned target tree.
//!
//! [`VersionedTree`] keeps two roots: the root of the published version and a
//! working root that staged mutations rewrite copy-on-write. Every mutation
//! stores new blobs and trees for the changed path only; unchanged subtrees
//! are shared by ID. Publishing writes a [`Version`] object linking to the
//! previous version and swaps the version pointer, which is the only mutable
//! state.

use std::sync::{Arc, RwLock};

use canopy_store::{Blob, ObjectStore, Tree, TreeEntry, Version};
use canopy_types::{DirEntry, EntryKind, ObjectId, TreePath};
use tracing::{debug, info};

use crate::error::{TreeError, TreeResult};
use crate::traits::{MutationOptions, TargetTree, TreeReader};

#[derive(Clone, Debug)]
struct TreeState {
    /// Published version identifier.
    version: ObjectId,
    published: Version,
    /// Root tree observed by reads and rewritten by staged mutations.
    working: ObjectId,
}

/// One entry of a version history walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionEntry {
    pub id: ObjectId,
    pub version: Version,
}

/// A [`TargetTree`] over an [`ObjectStore`].
pub struct VersionedTree {
    store: Arc<dyn ObjectStore>,
    state: RwLock<TreeState>,
}

impl std::fmt::Debug for VersionedTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("VersionedTree")
            .field("version", &state.version)
            .field("seq", &state.published.seq)
            .field("staged", &(state.working != state.published.root))
            .finish()
    }
}

impl VersionedTree {
    /// Create a new tree whose genesis version has an empty root.
    pub fn create(store: Arc<dyn ObjectStore>) -> TreeResult<Self> {
        let root = store.write(&Tree::empty().to_stored_object()?)?;
        let genesis = Version::genesis(root);
        let version = store.write(&genesis.to_stored_object()?)?;
        info!(version = %version.short_hex(), "created empty tree");
        Ok(Self::from_parts(store, version, genesis))
    }

    /// Open the tree at a previously published version.
    pub fn open(store: Arc<dyn ObjectStore>, version: ObjectId) -> TreeResult<Self> {
        let published = Version::from_stored_object(&store.require(&version)?)?;
        debug!(version = %version.short_hex(), seq = published.seq, "opened tree");
        Ok(Self::from_parts(store, version, published))
    }

    fn from_parts(store: Arc<dyn ObjectStore>, version: ObjectId, published: Version) -> Self {
        let working = published.root;
        Self {
            store,
            state: RwLock::new(TreeState {
                version,
                published,
                working,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// The published version object.
    pub fn published(&self) -> Version {
        self.state.read().expect("lock poisoned").published.clone()
    }

    /// Returns `true` if mutations are staged but not yet published.
    pub fn has_staged_changes(&self) -> bool {
        let state = self.state.read().expect("lock poisoned");
        state.working != state.published.root
    }

    /// Walk the version history from the published version backwards.
    pub fn history(&self, limit: usize) -> TreeResult<Vec<VersionEntry>> {
        let mut out = Vec::new();
        let mut next = Some(self.version());
        while let Some(id) = next {
            if out.len() >= limit {
                break;
            }
            let version = Version::from_stored_object(&self.store.require(&id)?)?;
            next = version.parent;
            out.push(VersionEntry { id, version });
        }
        Ok(out)
    }

    fn load_tree(&self, id: &ObjectId) -> TreeResult<Tree> {
        Ok(Tree::from_stored_object(&self.store.require(id)?)?)
    }

    fn store_tree(&self, tree: &Tree) -> TreeResult<ObjectId> {
        Ok(self.store.write(&tree.to_stored_object()?)?)
    }

    /// Resolve `path` under `root` to the entry naming it. The root itself
    /// resolves to a synthetic directory entry.
    fn lookup(&self, root: ObjectId, path: &TreePath) -> TreeResult<TreeEntry> {
        let mut current = TreeEntry::directory(".", root);
        for (depth, segment) in path.segments().iter().enumerate() {
            if current.kind != EntryKind::Directory {
                return Err(TreeError::NotADirectory {
                    path: path.prefix(depth),
                });
            }
            let tree = self.load_tree(&current.object_id)?;
            current = tree
                .get(segment)
                .cloned()
                .ok_or_else(|| TreeError::NotFound { path: path.clone() })?;
        }
        Ok(current)
    }

    /// Rebuild the directory chain down to `path`'s parent, applying `edit`
    /// to the parent tree with `path`'s final name. Missing intermediate
    /// directories are created when `create_missing` is set. Returns the new
    /// root tree ID.
    fn rewrite(
        &self,
        dir: Option<ObjectId>,
        path: &TreePath,
        depth: usize,
        create_missing: bool,
        edit: &mut dyn FnMut(&mut Tree, &str) -> TreeResult<()>,
    ) -> TreeResult<ObjectId> {
        let mut tree = match dir {
            Some(id) => self.load_tree(&id)?,
            None => Tree::empty(),
        };
        let segments = path.segments();
        let name = segments[depth].as_str();

        if depth + 1 == segments.len() {
            edit(&mut tree, name)?;
        } else {
            let child = match tree.get(name) {
                Some(entry) if entry.kind == EntryKind::Directory => Some(entry.object_id),
                Some(_) => {
                    return Err(TreeError::NotADirectory {
                        path: path.prefix(depth + 1),
                    })
                }
                None if create_missing => None,
                None => return Err(TreeError::NotFound { path: path.clone() }),
            };
            let child_id = self.rewrite(child, path, depth + 1, create_missing, edit)?;
            tree.upsert(TreeEntry::directory(name, child_id));
        }
        self.store_tree(&tree)
    }

    /// Apply `edit` to the working root under the state lock.
    fn stage(
        &self,
        path: &TreePath,
        create_missing: bool,
        edit: &mut dyn FnMut(&mut Tree, &str) -> TreeResult<()>,
    ) -> TreeResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let working = self.rewrite(Some(state.working), path, 0, create_missing, edit)?;
        state.working = working;
        Ok(())
    }

    fn finish(&self, options: MutationOptions, what: &str, path: &TreePath) -> TreeResult<()> {
        if options.commit {
            self.commit(&format!("{what} {path}"))?;
        }
        Ok(())
    }
}

impl TreeReader for VersionedTree {
    fn list(&self, path: &TreePath) -> TreeResult<Vec<DirEntry>> {
        let root = self.state.read().expect("lock poisoned").working;
        let entry = self.lookup(root, path)?;
        if entry.kind != EntryKind::Directory {
            return Err(TreeError::NotADirectory { path: path.clone() });
        }
        let tree = self.load_tree(&entry.object_id)?;
        Ok(tree.entries.iter().map(TreeEntry::to_dir_entry).collect())
    }

    fn read(&self, path: &TreePath) -> TreeResult<Vec<u8>> {
        let root = self.state.read().expect("lock poisoned").working;
        let entry = self.lookup(root, path)?;
        if entry.kind == EntryKind::Directory {
            return Err(TreeError::IsADirectory { path: path.clone() });
        }
        let stored = self.store.require(&entry.object_id)?;
        Ok(Blob::from_stored_object(stored)?.data)
    }
}

impl TargetTree for VersionedTree {
    fn write(&self, path: &TreePath, bytes: &[u8], options: MutationOptions) -> TreeResult<()> {
        if path.is_root() {
            return Err(TreeError::IsADirectory { path: path.clone() });
        }
        let blob = self.store.write(&Blob::new(bytes.to_vec()).to_stored_object())?;
        let size = bytes.len() as u64;
        self.stage(path, true, &mut |tree, name| {
            if matches!(tree.get(name), Some(e) if e.kind == EntryKind::Directory) {
                return Err(TreeError::IsADirectory { path: path.clone() });
            }
            tree.upsert(TreeEntry::file(name, blob, size));
            Ok(())
        })?;
        debug!(path = %path, size, "staged write");
        self.finish(options, "write", path)
    }

    fn make_directory(&self, path: &TreePath, options: MutationOptions) -> TreeResult<()> {
        if path.is_root() {
            return Ok(());
        }
        let empty = self.store_tree(&Tree::empty())?;
        self.stage(path, true, &mut |tree, name| match tree.get(name) {
            Some(e) if e.kind == EntryKind::Directory => Ok(()),
            Some(_) => Err(TreeError::AlreadyExists { path: path.clone() }),
            None => {
                tree.upsert(TreeEntry::directory(name, empty));
                Ok(())
            }
        })?;
        debug!(path = %path, "staged mkdir");
        self.finish(options, "mkdir", path)
    }

    fn remove_path(&self, path: &TreePath, options: MutationOptions) -> TreeResult<()> {
        if path.is_root() {
            return Err(TreeError::InvalidPath {
                path: path.clone(),
                reason: "cannot remove the tree root".to_string(),
            });
        }
        self.stage(path, false, &mut |tree, name| {
            tree.remove(name)
                .map(|_| ())
                .ok_or_else(|| TreeError::NotFound { path: path.clone() })
        })?;
        debug!(path = %path, "staged remove");
        self.finish(options, "remove", path)
    }

    fn commit(&self, message: &str) -> TreeResult<ObjectId> {
        let mut state = self.state.write().expect("lock poisoned");
        if state.working == state.published.root {
            debug!(version = %state.version.short_hex(), "nothing staged; commit skipped");
            return Ok(state.version);
        }
        let next = Version {
            root: state.working,
            parent: Some(state.version),
            seq: state.published.seq + 1,
            message: message.to_string(),
        };
        let id = self.store.write(&next.to_stored_object()?)?;
        info!(version = %id.short_hex(), seq = next.seq, "committed version");
        state.version = id;
        state.published = next;
        Ok(id)
    }

    fn discard(&self) -> TreeResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        if state.working != state.published.root {
            debug!(version = %state.version.short_hex(), "discarding staged mutations");
        }
        state.working = state.published.root;
        Ok(())
    }

    fn version(&self) -> ObjectId {
        self.state.read().expect("lock poisoned").version
    }
}
