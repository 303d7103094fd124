use std::collections::HashMap;
use std::sync::RwLock;

use canopy_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock` and
/// cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Blob, ObjectKind, Tree, TreeEntry};

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = Blob::new(b"hello world".to_vec()).to_stored_object();
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = Blob::new(b"dup".to_vec()).to_stored_object();
        let a = store.write(&obj).unwrap();
        let b = store.write(&obj).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn tree_decodes_after_read() {
        let store = InMemoryObjectStore::new();
        let tree = Tree::new(vec![TreeEntry::file("hello.txt", ObjectId::from_bytes(b"h"), 5)]);
        let id = store.write(&tree.to_stored_object().unwrap()).unwrap();
        let back = store.require(&id).unwrap();
        assert_eq!(back.kind, ObjectKind::Tree);
        assert_eq!(Tree::from_stored_object(&back).unwrap(), tree);
    }

    #[test]
    fn missing_object() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"nope");
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
        assert!(matches!(store.require(&id), Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn empty_store_holds_no_null_object() {
        let store = InMemoryObjectStore::new();
        assert!(store.is_empty());
        assert!(store.read(&ObjectId::null()).unwrap().is_none());
        assert!(!store.exists(&ObjectId::null()).unwrap());
    }
}
