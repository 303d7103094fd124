//! Tree access for Canopy.
//!
//! Both sides of a sync are reached through the [`TreeReader`] trait; the
//! target side additionally implements [`TargetTree`], the mutation surface
//! the snapshot applier drives.
//!
//! # Implementations
//!
//! - [`LocalTree`] : read-only view of a directory on the local filesystem
//! - [`VersionedTree`] : content-addressed, versioned tree over an
//!   [`ObjectStore`](canopy_store::ObjectStore), with staged mutations and a
//!   single published version pointer
//!
//! The two implementations share nothing beyond the traits.

pub mod error;
pub mod local;
pub mod traits;
pub mod versioned;

pub use error::{TreeError, TreeResult};
pub use local::LocalTree;
pub use traits::{MutationOptions, TargetTree, TreeReader};
pub use versioned::{VersionEntry, VersionedTree};
