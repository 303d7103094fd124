//! The last published version, persisted between invocations.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::Context;
use canopy_types::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(serialize_with = "hex_out", deserialize_with = "hex_in")]
    pub root_version: ObjectId,
}

fn hex_out<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(id)
}

fn hex_in<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ObjectId, D::Error> {
    let hex = String::deserialize(deserializer)?;
    hex.parse().map_err(serde::de::Error::custom)
}

impl SyncState {
    pub fn new(root_version: ObjectId) -> Self {
        Self { root_version }
    }

    /// Read the state file; `None` if it does not exist yet.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(state))
    }

    /// Replace the state file atomically.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state.json");
        let state = SyncState::new(ObjectId::from_bytes(b"v1"));
        state.save(&path).unwrap();
        assert_eq!(SyncState::load(&path).unwrap(), Some(state));
    }

    #[test]
    fn version_is_stored_as_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let id = ObjectId::from_bytes(b"v2");
        SyncState::new(id).save(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(&id.to_hex()));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SyncState::load(&dir.path().join("state.json")).unwrap().is_none());
    }

    #[test]
    fn malformed_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"root_version":"not-hex"}"#).unwrap();
        assert!(SyncState::load(&path).is_err());
    }
}
