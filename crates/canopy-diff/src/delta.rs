//! The difference tree produced by [`diff`](crate::diff).

use std::collections::BTreeMap;
use std::fmt;

use canopy_types::EntryKind;
use serde::Serialize;

/// Classification of one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaKind {
    Unchanged,
    /// Present only in the local tree.
    Added,
    /// Present on both sides with different content.
    Changed,
    /// Present only in the target tree.
    Removed,
    /// A file on one side and a directory on the other.
    Replaced { old: EntryKind, new: EntryKind },
}

impl DeltaKind {
    /// One-character marker used by the renderer.
    pub fn marker(&self) -> char {
        match self {
            Self::Unchanged => '=',
            Self::Added => '+',
            Self::Changed => '~',
            Self::Removed => '-',
            Self::Replaced { .. } => '!',
        }
    }
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Added => write!(f, "added"),
            Self::Changed => write!(f, "changed"),
            Self::Removed => write!(f, "removed"),
            Self::Replaced { old, new } => write!(f, "replaced ({old} -> {new})"),
        }
    }
}

/// One node of a difference tree.
///
/// Only differing entries are recorded: an `Unchanged` node never appears as
/// a child. `Added` and `Removed` directories carry their whole subtree with
/// the same kind. `entry` is the local kind, except for `Removed` nodes where
/// it is the target kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub kind: DeltaKind,
    pub name: String,
    pub entry: EntryKind,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Delta>,
}

impl Delta {
    pub fn file(kind: DeltaKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            entry: EntryKind::File,
            children: BTreeMap::new(),
        }
    }

    pub fn directory(
        kind: DeltaKind,
        name: impl Into<String>,
        children: BTreeMap<String, Delta>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            entry: EntryKind::Directory,
            children,
        }
    }

    /// A directory present on both sides: `Changed` iff any child differs.
    pub fn rollup(name: impl Into<String>, children: BTreeMap<String, Delta>) -> Self {
        let kind = if children.is_empty() {
            DeltaKind::Unchanged
        } else {
            DeltaKind::Changed
        };
        Self::directory(kind, name, children)
    }

    pub fn is_unchanged(&self) -> bool {
        self.kind == DeltaKind::Unchanged
    }

    pub fn is_dir(&self) -> bool {
        self.entry.is_dir()
    }

    pub fn child(&self, name: &str) -> Option<&Delta> {
        self.children.get(name)
    }

    /// Look up a descendant by slash-separated relative path.
    pub fn descendant(&self, path: &str) -> Option<&Delta> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, name| node.child(name))
    }

    /// Tally the recorded entries below this node. Directories that merely
    /// contain changes are not counted themselves.
    pub fn counts(&self) -> DeltaCounts {
        let mut counts = DeltaCounts::default();
        for child in self.children.values() {
            child.tally(&mut counts);
        }
        counts
    }

    fn tally(&self, counts: &mut DeltaCounts) {
        match self.kind {
            DeltaKind::Unchanged => {}
            DeltaKind::Added => counts.added += 1,
            DeltaKind::Changed if self.is_dir() => {}
            DeltaKind::Changed => counts.changed += 1,
            DeltaKind::Removed => counts.removed += 1,
            DeltaKind::Replaced { .. } => counts.replaced += 1,
        }
        for child in self.children.values() {
            child.tally(counts);
        }
    }
}

/// Per-kind entry counts of a delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeltaCounts {
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
    pub replaced: usize,
}

impl DeltaCounts {
    pub fn total(&self) -> usize {
        self.added + self.changed + self.removed + self.replaced
    }
}

impl fmt::Display for DeltaCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} changed, {} removed",
            self.added, self.changed, self.removed
        )?;
        if self.replaced > 0 {
            write!(f, ", {} replaced", self.replaced)?;
        }
        Ok(())
    }
}
