//! Tree-relative paths.
//!
//! Both sides of a sync address entries with a [`TreePath`]: a sequence of
//! validated names relative to the tree's root. The root itself is the empty
//! path and displays as `.`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Check that `name` is usable as a single path segment.
pub fn validate_name(name: &str) -> Result<(), TypeError> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name == "." || name == ".." {
        "relative segment"
    } else if name.contains('/') || name.contains('\\') {
        "contains a path separator"
    } else if name.contains('\0') {
        "contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(TypeError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// A slash-separated path relative to a tree root.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreePath {
    segments: Vec<String>,
}

impl TreePath {
    /// The root of a tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-separated path. Empty and `.` segments are dropped, so
    /// `""`, `"."` and `"/"` all denote the root. `..` is rejected.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let mut segments = Vec::new();
        for segment in s.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            validate_name(segment).map_err(|e| TypeError::InvalidPath {
                path: s.to_string(),
                reason: e.to_string(),
            })?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Append one entry name.
    ///
    /// Names come from directory listings, which only yield valid names.
    pub fn join(&self, name: &str) -> Self {
        debug_assert!(validate_name(name).is_ok(), "invalid segment {name:?}");
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// The first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Resolve against a filesystem directory.
    pub fn to_fs_path(&self, base: &Path) -> PathBuf {
        let mut out = base.to_path_buf();
        out.extend(&self.segments);
        out
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.segments.join("/"))
        }
    }
}

impl fmt::Debug for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreePath({self})")
    }
}
