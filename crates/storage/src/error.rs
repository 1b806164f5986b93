//! Errors raised by the filesystem plumbing.
//!
//! Every failure carries the path it happened on where one is known, so the
//! monitor's log lines can name the offending file.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, grouped by how the monitor reacts to it.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File or directory does not exist (or vanished mid-operation)
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Path has no usable file name component
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Any other filesystem failure
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The hash store document could not be encoded
    #[display("could not serialize hash store")]
    Serialization,
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Classify an I/O error against the path it happened on.
    pub(crate) fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }

    /// A file that vanished or is locked may well be back (or unlocked) on the
    /// next scan cycle, so most categories are worth another go.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::PermissionDenied(_) | Self::Io(_))
    }
}
