//! Foundation types for Canopy.
//!
//! Every other Canopy crate depends on `canopy-types`. The types here are the
//! vocabulary shared by both sides of a sync: the local directory tree and the
//! content-addressed target tree.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash)
//! - [`TreePath`]: Slash-separated path relative to a tree root
//! - [`EntryKind`]: File or directory
//! - [`Fingerprint`]: Comparable summary of file content
//! - [`DirEntry`]: One entry of a directory listing
//! - [`CancelToken`]: Cooperative cancellation flag

pub mod cancel;
pub mod entry;
pub mod error;
pub mod object;
pub mod path;

pub use cancel::CancelToken;
pub use entry::{DirEntry, EntryKind, Fingerprint};
pub use error::TypeError;
pub use object::ObjectId;
pub use path::{validate_name, TreePath};
