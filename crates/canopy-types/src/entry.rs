//! Directory listing entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// Whether an entry is a file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Opaque, comparable summary of a file's content.
///
/// `content` is the domain-separated blob hash of the file's bytes, so a local
/// file and a target blob with identical bytes have equal fingerprints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub size: u64,
    pub content: ObjectId,
}

impl Fingerprint {
    pub fn new(size: u64, content: ObjectId) -> Self {
        Self { size, content }
    }
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Base name, unique within its directory.
    pub name: String,
    pub kind: EntryKind,
    /// Present for files, `None` for directories.
    pub fingerprint: Option<Fingerprint>,
}

impl DirEntry {
    pub fn file(name: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            fingerprint: Some(fingerprint),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            fingerprint: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        let fp = Fingerprint::new(3, ObjectId::from_bytes(b"abc"));
        let f = DirEntry::file("a.txt", fp);
        assert!(!f.is_dir());
        assert_eq!(f.fingerprint, Some(fp));

        let d = DirEntry::directory("sub");
        assert!(d.is_dir());
        assert!(d.fingerprint.is_none());
    }

    #[test]
    fn fingerprints_compare_by_size_and_content() {
        let id = ObjectId::from_bytes(b"abc");
        assert_eq!(Fingerprint::new(3, id), Fingerprint::new(3, id));
        assert_ne!(Fingerprint::new(3, id), Fingerprint::new(4, id));
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EntryKind::Directory).unwrap(), "\"directory\"");
        assert_eq!(EntryKind::File.to_string(), "file");
    }
}
