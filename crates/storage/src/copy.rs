//! Metadata-preserving file copies.

use filetime::FileTime;
use std::path::Path;
use tokio::fs;

use crate::error::{ErrorKind, Result};

/// Copies `from` to `to`, carrying over permission bits and timestamps.
///
/// Permission bits come along with [`tokio::fs::copy`] itself. Access and
/// modification times are applied afterwards; failing to set them is logged
/// but does not fail the copy, since the bytes are already in place and
/// some filesystems (FAT-formatted removable media, some network shares)
/// refuse timestamp updates.
///
/// Returns the number of bytes copied.
pub async fn copy_preserving(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    let (from, to) = (from.as_ref(), to.as_ref());
    let metadata = fs::metadata(from).await.map_err(|e| ErrorKind::from_io(e, from))?;
    let bytes = fs::copy(from, to).await.map_err(|e| ErrorKind::from_io(e, to))?;

    let modified = FileTime::from_last_modification_time(&metadata);
    let accessed = FileTime::from_last_access_time(&metadata);
    if let Err(e) = filetime::set_file_times(to, accessed, modified) {
        tracing::debug!(path = %to.display(), error = %e, "Could not preserve timestamps on copy");
    }
    Ok(bytes)
}

/// Creates `dir` (and any missing parents) if it does not exist yet.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    Ok(fs::create_dir_all(dir).await.map_err(|e| ErrorKind::from_io(e, dir))?)
}
