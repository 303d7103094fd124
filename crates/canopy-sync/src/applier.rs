//! Replays a delta against the target tree.

use canopy_diff::walk::for_each_child;
use canopy_diff::{Delta, DeltaKind};
use canopy_tree::{MutationOptions, TargetTree, TreeReader};
use canopy_types::{CancelToken, ObjectId, TreePath};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::mutation::Mutation;

/// Counts of the mutations issued by one apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub files_written: usize,
    pub bytes_written: u64,
    pub directories_created: usize,
    pub paths_removed: usize,
}

impl ApplySummary {
    fn record(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::WriteFile { bytes, .. } => {
                self.files_written += 1;
                self.bytes_written += bytes.len() as u64;
            }
            Mutation::MakeDirectory { .. } => self.directories_created += 1,
            Mutation::RemovePath { .. } => self.paths_removed += 1,
        }
    }
}

/// Result of a successful apply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    /// The version current after the call.
    pub version: ObjectId,
    /// The version current before the call.
    pub previous: ObjectId,
    /// Whether a new version was published.
    pub committed: bool,
    pub summary: ApplySummary,
}

/// Drives one delta into a target tree.
///
/// The applier trusts the delta: it must come from a diff of the same two
/// roots, and nothing is re-checked before mutating.
pub struct Applier<'a> {
    target: &'a dyn TargetTree,
    local: &'a dyn TreeReader,
    cancel: CancelToken,
    message: String,
}

impl<'a> Applier<'a> {
    pub fn new(target: &'a dyn TargetTree, local: &'a dyn TreeReader) -> Self {
        Self {
            target,
            local,
            cancel: CancelToken::new(),
            message: "sync".to_string(),
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Message recorded on the published version.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Apply `delta`, whose root corresponds to `target_root` on the target
    /// and `local_root` on the local side.
    pub fn apply(
        &self,
        target_root: &TreePath,
        local_root: &TreePath,
        delta: &Delta,
    ) -> SyncResult<ApplyOutcome> {
        let previous = self.target.version();
        if delta.is_unchanged() {
            debug!(version = %previous.short_hex(), "nothing to apply");
            return Ok(ApplyOutcome {
                version: previous,
                previous,
                committed: false,
                summary: ApplySummary::default(),
            });
        }

        let mut run = Run {
            applier: self,
            previous,
            summary: ApplySummary::default(),
        };
        let staged = run
            .node(target_root, local_root, delta)
            .and_then(|()| run.check_cancel());
        if let Err(err) = staged {
            self.rollback();
            return Err(err);
        }

        let version = match self.target.commit(&self.message) {
            Ok(version) => version,
            Err(source) => {
                self.rollback();
                return Err(SyncError::Commit {
                    current: previous,
                    source,
                });
            }
        };
        let summary = run.summary;
        info!(
            version = %version.short_hex(),
            previous = %previous.short_hex(),
            files = summary.files_written,
            removed = summary.paths_removed,
            "applied snapshot"
        );
        Ok(ApplyOutcome {
            version,
            previous,
            committed: version != previous,
            summary,
        })
    }

    fn rollback(&self) {
        if let Err(e) = self.target.discard() {
            warn!(error = %e, "failed to discard staged mutations");
        }
    }
}

/// Apply `delta` with default options. See [`Applier::apply`].
pub fn apply(
    target: &dyn TargetTree,
    local: &dyn TreeReader,
    target_root: &TreePath,
    local_root: &TreePath,
    delta: &Delta,
) -> SyncResult<ApplyOutcome> {
    Applier::new(target, local).apply(target_root, local_root, delta)
}

/// State of one apply call.
struct Run<'r, 'a> {
    applier: &'r Applier<'a>,
    previous: ObjectId,
    summary: ApplySummary,
}

impl Run<'_, '_> {
    fn check_cancel(&self) -> SyncResult<()> {
        if self.applier.cancel.is_cancelled() {
            debug!("apply cancelled");
            return Err(SyncError::Cancelled {
                current: self.previous,
            });
        }
        Ok(())
    }

    fn node(
        &mut self,
        target_path: &TreePath,
        local_path: &TreePath,
        delta: &Delta,
    ) -> SyncResult<()> {
        match delta.kind {
            DeltaKind::Unchanged => Ok(()),
            // the tree root itself cannot be removed, only emptied
            DeltaKind::Removed if target_path.is_root() => {
                self.children(target_path, local_path, delta)
            }
            DeltaKind::Removed => self.perform(Mutation::RemovePath {
                path: target_path.clone(),
            }),
            DeltaKind::Replaced { .. } => {
                self.perform(Mutation::RemovePath {
                    path: target_path.clone(),
                })?;
                self.create(target_path, local_path, delta)
            }
            DeltaKind::Added => self.create(target_path, local_path, delta),
            DeltaKind::Changed if delta.is_dir() => self.children(target_path, local_path, delta),
            DeltaKind::Changed => self.write_file(target_path, local_path),
        }
    }

    fn create(
        &mut self,
        target_path: &TreePath,
        local_path: &TreePath,
        delta: &Delta,
    ) -> SyncResult<()> {
        if !delta.is_dir() {
            return self.write_file(target_path, local_path);
        }
        if !target_path.is_root() {
            self.perform(Mutation::MakeDirectory {
                path: target_path.clone(),
            })?;
        }
        self.children(target_path, local_path, delta)
    }

    fn children(
        &mut self,
        target_path: &TreePath,
        local_path: &TreePath,
        delta: &Delta,
    ) -> SyncResult<()> {
        for_each_child(delta, |child, _| {
            self.node(
                &target_path.join(&child.name),
                &local_path.join(&child.name),
                child,
            )
        })
    }

    fn write_file(&mut self, target_path: &TreePath, local_path: &TreePath) -> SyncResult<()> {
        self.check_cancel()?;
        let bytes = self
            .applier
            .local
            .read(local_path)
            .map_err(|source| SyncError::Read {
                path: local_path.clone(),
                current: self.previous,
                source,
            })?;
        self.perform(Mutation::WriteFile {
            path: target_path.clone(),
            bytes,
        })
    }

    fn perform(&mut self, mutation: Mutation) -> SyncResult<()> {
        self.check_cancel()?;
        mutation
            .apply(self.applier.target, MutationOptions::STAGE)
            .map_err(|source| mutation.failed(source, self.previous))?;
        debug!(%mutation, "staged");
        self.summary.record(&mutation);
        Ok(())
    }
}
