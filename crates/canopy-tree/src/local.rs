//! Read-only view of a local directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use canopy_store::ContentHasher;
use canopy_types::{validate_name, DirEntry, Fingerprint, TreePath};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{TreeError, TreeResult};
use crate::traits::TreeReader;

/// A [`TreeReader`] over a base directory on the local filesystem.
///
/// Paths are resolved relative to `base`. Symbolic links and other special
/// files are not followed and do not appear in listings. File fingerprints
/// are the streamed blob hash of the file's content, so they compare equal to
/// the target tree's entries for the same bytes.
#[derive(Clone, Debug)]
pub struct LocalTree {
    base: PathBuf,
}

impl LocalTree {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn fingerprint(&self, path: &TreePath, fs_path: &Path) -> TreeResult<Fingerprint> {
        let file = File::open(fs_path).map_err(|e| TreeError::from_io(path, e))?;
        let (content, size) = ContentHasher::BLOB
            .hash_reader(io::BufReader::new(file))
            .map_err(|e| TreeError::from_io(path, e))?;
        Ok(Fingerprint::new(size, content))
    }
}

fn walk_error(path: &TreePath, err: walkdir::Error) -> TreeError {
    match err.into_io_error() {
        Some(io_err) => TreeError::from_io(path, io_err),
        None => TreeError::Io {
            path: path.clone(),
            source: io::Error::other("filesystem loop detected"),
        },
    }
}

impl TreeReader for LocalTree {
    fn list(&self, path: &TreePath) -> TreeResult<Vec<DirEntry>> {
        self.list_filtered(path, &|_| true)
    }

    fn list_filtered(
        &self,
        path: &TreePath,
        keep: &dyn Fn(&str) -> bool,
    ) -> TreeResult<Vec<DirEntry>> {
        let dir = path.to_fs_path(&self.base);
        let meta = fs::metadata(&dir).map_err(|e| TreeError::from_io(path, e))?;
        if !meta.is_dir() {
            return Err(TreeError::NotADirectory { path: path.clone() });
        }

        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for item in walker {
            let item = item.map_err(|e| walk_error(path, e))?;
            let Some(name) = item.file_name().to_str() else {
                warn!(dir = %path, name = ?item.file_name(), "skipping non UTF-8 entry name");
                continue;
            };
            if validate_name(name).is_err() {
                warn!(dir = %path, name, "skipping unusable entry name");
                continue;
            }
            if !keep(name) {
                continue;
            }

            let file_type = item.file_type();
            if file_type.is_dir() {
                entries.push(DirEntry::directory(name));
            } else if file_type.is_file() {
                let child = path.join(name);
                let fingerprint = self.fingerprint(&child, item.path())?;
                entries.push(DirEntry::file(name, fingerprint));
            } else {
                debug!(dir = %path, name, "skipping special file");
            }
        }
        Ok(entries)
    }

    fn read(&self, path: &TreePath) -> TreeResult<Vec<u8>> {
        let fs_path = path.to_fs_path(&self.base);
        let meta = fs::symlink_metadata(&fs_path).map_err(|e| TreeError::from_io(path, e))?;
        if meta.is_dir() {
            return Err(TreeError::IsADirectory { path: path.clone() });
        }
        fs::read(&fs_path).map_err(|e| TreeError::from_io(path, e))
    }
}
