//! Snapshot application for Canopy.
//!
//! Replays a [`Delta`](canopy_diff::Delta) against a
//! [`TargetTree`](canopy_tree::TargetTree). Every mutation is staged and the
//! batch is published as exactly one new version; on any failure the staged
//! work is discarded and the previously published version stays current.

pub mod applier;
pub mod error;
pub mod mutation;

pub use applier::{apply, Applier, ApplyOutcome, ApplySummary};
pub use canopy_types::CancelToken;
pub use error::{SyncError, SyncResult};
pub use mutation::Mutation;
