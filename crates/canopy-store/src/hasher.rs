use std::io::{self, Read};

use canopy_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a blob and a tree with identical bytes never share an
/// `ObjectId`.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file content.
    pub const BLOB: Self = Self {
        domain: "canopy-blob-v1",
    };
    /// Hasher for directory listings.
    pub const TREE: Self = Self {
        domain: "canopy-tree-v1",
    };
    /// Hasher for published versions.
    pub const VERSION: Self = Self {
        domain: "canopy-version-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash everything `reader` yields, returning the ID and the byte count.
    pub fn hash_reader(&self, mut reader: impl Read) -> io::Result<(ObjectId, u64)> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        let len = io::copy(&mut reader, &mut hasher)?;
        Ok((ObjectId::from_hash(*hasher.finalize().as_bytes()), len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(ContentHasher::BLOB.hash(b"x"), ContentHasher::BLOB.hash(b"x"));
    }

    #[test]
    fn domains_separate() {
        let data = b"same content";
        let blob = ContentHasher::BLOB.hash(data);
        let tree = ContentHasher::TREE.hash(data);
        let version = ContentHasher::VERSION.hash(data);
        assert_ne!(blob, tree);
        assert_ne!(blob, version);
        assert_ne!(tree, version);
        assert_ne!(blob, ObjectId::from_bytes(data));
    }

    #[test]
    fn streaming_matches_in_memory() {
        let data = vec![7u8; 100_000];
        let (id, len) = ContentHasher::BLOB.hash_reader(data.as_slice()).unwrap();
        assert_eq!(len, 100_000);
        assert_eq!(id, ContentHasher::BLOB.hash(&data));
    }
}
