//! Filesystem plumbing for watched folders.
//!
//! Everything here is a thin, well-typed wrapper over local filesystem
//! operations. No decisions are made in this crate: it lists, hashes, copies
//! and persists, and reports failures as [`error::Error`] values for the
//! monitor to act on.

mod copy;
mod digest;
pub mod error;
mod listing;
mod path;
mod store;

pub use crate::copy::{copy_preserving, ensure_dir};
pub use crate::digest::hash_file;
pub use crate::listing::{ListedFile, list_files};
pub use crate::path::{basename, destination_for, encode_source};
pub use crate::store::{HashStore, ProcessedHashes};
