//! Single-level directory listings.
//!
//! Unlike a library walk, a watched folder is only ever listed one level deep:
//! sub-directories are somebody else's business.

use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

use crate::error::{ErrorKind, Result};

/// A regular file found directly inside a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// Absolute (or source-relative, if the source was relative) path.
    pub path: PathBuf,
    /// Final path component, lossily converted to UTF8.
    pub name: String,
}

enum ListEntry {
    File(ListedFile),
    Skip,
}

/// Lists the regular files directly inside `dir`, in whatever order the
/// operating system returns them.
///
/// Symlinks are followed, so a link pointing at a regular file is listed and
/// a dangling link is silently dropped, as are directories and anything else
/// that isn't a regular file. An entry that disappears between being listed
/// and being inspected is dropped too; it was never ours to copy.
///
/// Failing to open or iterate `dir` itself is an error. A missing directory
/// is **not** treated as empty: a watched folder on removable media that
/// vanished is worth shouting about.
pub async fn list_files(dir: impl AsRef<Path>) -> Result<Vec<ListedFile>> {
    let dir = dir.as_ref();
    let mut entries = fs::read_dir(dir).await.map_err(|e| ErrorKind::from_io(e, dir))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::from_io(e, dir))? {
        match process_entry(entry).await {
            ListEntry::File(file) => files.push(file),
            ListEntry::Skip => {},
        }
    }
    Ok(files)
}

async fn process_entry(entry: DirEntry) -> ListEntry {
    let path = entry.path();
    // `fs::metadata` follows symlinks, `DirEntry::metadata` does not.
    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable directory entry");
            return ListEntry::Skip;
        },
    };
    if !metadata.is_file() {
        return ListEntry::Skip;
    }
    let name = entry.file_name().to_string_lossy().into_owned();
    ListEntry::File(ListedFile { path, name })
}
