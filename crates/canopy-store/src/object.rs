use canopy_types::{validate_name, DirEntry, EntryKind, Fingerprint, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw file content.
    Blob,
    /// Directory listing: sorted entries mapping names to object references.
    Tree,
    /// A published version of a target tree.
    Version,
}

impl ObjectKind {
    fn hasher(self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Tree => &ContentHasher::TREE,
            Self::Version => &ContentHasher::VERSION,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Version => write!(f, "version"),
        }
    }
}

/// A stored object: kind tag + serialized data.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// data; it is a pure key-value store keyed by content hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Compute the content-addressed ID with the kind's domain hasher.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw file content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The ID this content will be stored under, without storing it.
    pub fn id_of(data: &[u8]) -> ObjectId {
        ContentHasher::BLOB.hash(data)
    }

    /// Fingerprint of raw content, comparable with tree entry fingerprints.
    pub fn fingerprint_of(data: &[u8]) -> Fingerprint {
        Fingerprint::new(data.len() as u64, Self::id_of(data))
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self { data: obj.data })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Blob ID for files, tree ID for directories.
    pub object_id: ObjectId,
    /// Content length for files; zero for directories.
    pub size: u64,
}

impl TreeEntry {
    pub fn file(name: impl Into<String>, object_id: ObjectId, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            object_id,
            size,
        }
    }

    pub fn directory(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            object_id,
            size: 0,
        }
    }

    /// Listing view of this entry.
    pub fn to_dir_entry(&self) -> DirEntry {
        match self.kind {
            EntryKind::File => DirEntry::file(
                self.name.clone(),
                Fingerprint::new(self.size, self.object_id),
            ),
            EntryKind::Directory => DirEntry::directory(self.name.clone()),
        }
    }
}

/// Directory listing object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name, names unique.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree, sorting entries by name for deterministic hashing.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        let tree: Self = serde_json::from_slice(&obj.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tree.check(obj.compute_id())?;
        Ok(tree)
    }

    fn check(&self, id: ObjectId) -> StoreResult<()> {
        for pair in self.entries.windows(2) {
            if pair[0].name >= pair[1].name {
                return Err(StoreError::CorruptObject {
                    id,
                    reason: format!("entries out of order at {:?}", pair[1].name),
                });
            }
        }
        for entry in &self.entries {
            validate_name(&entry.name).map_err(|e| StoreError::CorruptObject {
                id,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Insert or replace the entry with the same name.
    pub fn upsert(&mut self, entry: TreeEntry) {
        match self
            .entries
            .binary_search_by(|e| e.name.as_str().cmp(&entry.name))
        {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Remove the entry with `name`, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<TreeEntry> {
        let i = self
            .entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()?;
        Some(self.entries.remove(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// A published, immutable version of a target tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Root tree of this version.
    pub root: ObjectId,
    /// The version this one was committed on top of.
    pub parent: Option<ObjectId>,
    /// Position in the history, genesis is 0.
    pub seq: u64,
    pub message: String,
}

impl Version {
    pub fn genesis(root: ObjectId) -> Self {
        Self {
            root,
            parent: None,
            seq: 0,
            message: "genesis".to_string(),
        }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Version, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Version)?;
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    #[test]
    fn blob_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Tree, b"not a blob".to_vec());
        let err = Blob::from_stored_object(stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn blob_fingerprint_matches_stored_id() {
        let data = b"hello world";
        let fp = Blob::fingerprint_of(data);
        assert_eq!(fp.size, 11);
        assert_eq!(fp.content, Blob::new(data.to_vec()).to_stored_object().compute_id());
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::file("zebra.txt", oid(1), 1),
            TreeEntry::file("alpha.txt", oid(2), 1),
            TreeEntry::directory("middle", oid(3)),
        ]);
        let names: Vec<_> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha.txt", "middle", "zebra.txt"]);
    }

    #[test]
    fn tree_upsert_and_remove() {
        let mut tree = Tree::empty();
        tree.upsert(TreeEntry::file("b", oid(1), 1));
        tree.upsert(TreeEntry::file("a", oid(2), 1));
        tree.upsert(TreeEntry::file("b", oid(3), 2));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.entries[0].name, "a");
        assert_eq!(tree.get("b").unwrap().object_id, oid(3));

        assert!(tree.remove("a").is_some());
        assert!(tree.remove("a").is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn tree_roundtrip_through_stored_object() {
        let tree = Tree::new(vec![
            TreeEntry::file("file.txt", oid(1), 7),
            TreeEntry::directory("subdir", oid(2)),
        ]);
        let stored = tree.to_stored_object().unwrap();
        assert_eq!(Tree::from_stored_object(&stored).unwrap(), tree);
    }

    #[test]
    fn unsorted_tree_payload_is_corrupt() {
        let tree = Tree {
            entries: vec![TreeEntry::file("b", oid(1), 1), TreeEntry::file("a", oid(2), 1)],
        };
        let stored = tree.to_stored_object().unwrap();
        assert!(matches!(
            Tree::from_stored_object(&stored),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn tree_entry_listing_view() {
        let f = TreeEntry::file("a.txt", oid(9), 5).to_dir_entry();
        assert_eq!(f.fingerprint, Some(Fingerprint::new(5, oid(9))));
        assert!(TreeEntry::directory("d", oid(1)).to_dir_entry().is_dir());
    }

    #[test]
    fn different_kinds_produce_different_ids() {
        let data = b"same data".to_vec();
        let blob = StoredObject::new(ObjectKind::Blob, data.clone());
        let tree = StoredObject::new(ObjectKind::Tree, data);
        assert_ne!(blob.compute_id(), tree.compute_id());
    }

    #[test]
    fn versions_with_different_parents_differ() {
        let root = oid(5);
        let genesis = Version::genesis(root);
        let next = Version {
            root,
            parent: Some(genesis.to_stored_object().unwrap().compute_id()),
            seq: 1,
            message: "sync".into(),
        };
        let a = genesis.to_stored_object().unwrap();
        let b = next.to_stored_object().unwrap();
        assert_ne!(a.compute_id(), b.compute_id());
        assert_eq!(Version::from_stored_object(&b).unwrap(), next);
    }
}
