//! Per-directory ignore patterns.
//!
//! Each local directory may hold an ignore file listing one glob per line.
//! Patterns are matched against entry base names in that directory only and
//! are not inherited by subdirectories.

use std::collections::BTreeSet;

use canopy_tree::TreeReader;
use canopy_types::TreePath;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::error::{DiffError, DiffResult};

/// Name of the ignore file looked up in every local directory.
pub const DEFAULT_IGNORE_FILE: &str = ".canopyignore";

/// Decides which entry names of one directory are excluded from comparison.
#[derive(Clone, Debug)]
pub struct IgnoreFilter {
    /// Always excluded: the ignore file itself plus caller-supplied names.
    reserved: BTreeSet<String>,
    patterns: GlobSet,
}

impl IgnoreFilter {
    /// A filter that excludes only the reserved names.
    pub fn new(ignore_file: &str, reserved: &[String]) -> Self {
        let mut names: BTreeSet<String> = reserved.iter().cloned().collect();
        names.insert(ignore_file.to_string());
        Self {
            reserved: names,
            patterns: GlobSet::empty(),
        }
    }

    /// Add the patterns of an ignore file's content. Blank lines and `#`
    /// comments are skipped, as are lines that are not valid globs.
    pub fn with_patterns(mut self, contents: &str) -> Self {
        let mut builder = GlobSetBuilder::new();
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match GlobBuilder::new(line).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern = line, error = %e, "skipping invalid ignore pattern"),
            }
        }
        self.patterns = match builder.build() {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, "ignore patterns could not be compiled; ignoring them");
                GlobSet::empty()
            }
        };
        self
    }

    /// Build the filter for local directory `dir` by reading its ignore file
    /// from `reader`. A missing ignore file means no patterns.
    pub fn load(
        reader: &dyn TreeReader,
        dir: &TreePath,
        ignore_file: &str,
        reserved: &[String],
    ) -> DiffResult<Self> {
        let filter = Self::new(ignore_file, reserved);
        let path = dir.join(ignore_file);
        match reader.read(&path) {
            Ok(bytes) => {
                let filter = filter.with_patterns(&String::from_utf8_lossy(&bytes));
                debug!(path = %path, patterns = filter.pattern_count(), "loaded ignore file");
                Ok(filter)
            }
            Err(e) if e.is_not_found() => Ok(filter),
            Err(source) => Err(DiffError::IgnoreFile { path, source }),
        }
    }

    pub fn excluded(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.patterns.is_match(name)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use canopy_tree::{LocalTree, TreeError};

    fn filter(contents: &str) -> IgnoreFilter {
        IgnoreFilter::new(DEFAULT_IGNORE_FILE, &[".canopy".to_string()]).with_patterns(contents)
    }

    #[test]
    fn reserved_names_always_excluded() {
        let f = filter("");
        assert!(f.excluded(".canopyignore"));
        assert!(f.excluded(".canopy"));
        assert!(!f.excluded("notes.md"));
    }

    #[test]
    fn comments_blanks_and_bad_globs_skipped() {
        let f = filter("# build output\n\n  *.log  \ntarget\n[unclosed\n");
        assert_eq!(f.pattern_count(), 2);
        assert!(f.excluded("debug.log"));
        assert!(f.excluded("target"));
        assert!(!f.excluded("# build output"));
        assert!(!f.excluded("[unclosed"));
    }

    #[test]
    fn patterns_match_base_names_only() {
        let f = filter("*.tmp\nsub/*.txt\n");
        assert!(f.excluded("x.tmp"));
        assert!(!f.excluded("one.txt"));
    }

    #[test]
    fn load_from_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("proj")).unwrap();
        fs::write(dir.path().join("proj/.canopyignore"), "*.bak\n").unwrap();
        let tree = LocalTree::new(dir.path());

        let proj = TreePath::parse("proj").unwrap();
        let f = IgnoreFilter::load(&tree, &proj, DEFAULT_IGNORE_FILE, &[]).unwrap();
        assert!(f.excluded("old.bak"));

        let none = IgnoreFilter::load(&tree, &TreePath::root(), DEFAULT_IGNORE_FILE, &[]).unwrap();
        assert_eq!(none.pattern_count(), 0);
    }

    #[test]
    fn unreadable_ignore_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(DEFAULT_IGNORE_FILE)).unwrap();
        let tree = LocalTree::new(dir.path());
        let err =
            IgnoreFilter::load(&tree, &TreePath::root(), DEFAULT_IGNORE_FILE, &[]).unwrap_err();
        assert!(matches!(
            err,
            DiffError::IgnoreFile {
                source: TreeError::IsADirectory { .. },
                ..
            }
        ));
    }
}
