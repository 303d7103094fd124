//! Diff engine for Canopy.
//!
//! Walks a target tree and a local tree in lock-step and produces a [`Delta`]
//! tree that classifies every differing entry as added, changed, removed or
//! replaced. The delta is consumed by the renderer for display, or by the
//! snapshot applier in `canopy-sync`.
//!
//! # Key Types
//!
//! - [`Delta`] / [`DeltaKind`]: one node of the difference tree
//! - [`IgnoreFilter`]: per-directory ignore patterns
//! - [`DiffOptions`] / [`TypeConflictPolicy`]: knobs for [`diff`]

pub mod delta;
pub mod engine;
pub mod error;
pub mod ignore;
pub mod render;
pub mod walk;

pub use delta::{Delta, DeltaCounts, DeltaKind};
pub use engine::{diff, DiffOptions, TypeConflictPolicy};
pub use error::{DiffError, DiffResult, Side};
pub use ignore::{IgnoreFilter, DEFAULT_IGNORE_FILE};
pub use render::{render, render_json, render_listing, render_with, Painter, Plain};
