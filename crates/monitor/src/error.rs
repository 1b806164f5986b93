//! Monitor Error Types
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Errors never leave the per-file pipeline or the folder loop; they exist so
//! that every failure reaching the log carries its full cause chain.

use derive_more::{Display, Error};

/// A monitor error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a monitor failure.
///
/// Each variant identifies the step that failed, allowing callers to inspect
/// the error tree without matching on opaque strings.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The candidate path has no usable file name.
    #[display("invalid candidate path")]
    Candidate,
    /// Checking or creating the destination failed.
    #[display("destination unavailable")]
    Destination,
    /// Copying the file into the destination failed.
    #[display("copy failed")]
    Copy,
    /// The source directory could not be listed.
    #[display("source listing failed")]
    Listing,
}

impl ErrorKind {
    /// Returns `true` if retrying (on the next scan cycle) might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Candidate)
    }
}
