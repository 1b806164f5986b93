//! Single-instance guard.
//!
//! Two copies of the program watching the same folders would race each other
//! through the destination-exists check, so the second one to start backs
//! off. The lock is an advisory `fs2` lock on a small file holding the owner's
//! process id.

use exn::ResultExt;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

pub const DEFAULT_LOCK_FILE: &str = "ferry.lock";

/// Holds the instance lock until dropped, then removes the lock file.
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

impl InstanceGuard {
    /// Takes the lock at `path` without waiting.
    ///
    /// Fails with [`AlreadyRunning`](ErrorKind::AlreadyRunning) if another
    /// process holds it.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lock_error = || ErrorKind::Lock(path.to_path_buf());
        // Not truncated on open: the pid inside belongs to whoever holds the lock.
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .or_raise(lock_error)?;

        // `std::fs::File` grew its own inherent `try_lock_exclusive` with a
        // different error type; call the fs2 one explicitly.
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {},
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                exn::bail!(ErrorKind::AlreadyRunning(path.to_path_buf()));
            },
            Err(e) => return Err(e).or_raise(lock_error),
        }

        file.set_len(0).or_raise(lock_error)?;
        write!(file, "{}", std::process::id()).or_raise(lock_error)?;
        file.flush().or_raise(lock_error)?;
        tracing::debug!(path = %path.display(), pid = std::process::id(), "Acquired instance lock");
        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Could not remove instance lock file");
        }
        _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_pid_and_removes_on_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ferry.lock");
        let guard = InstanceGuard::acquire(&path).unwrap();
        assert_eq!(guard.path(), path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), std::process::id().to_string());
        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_instance_is_refused() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ferry.lock");
        let _guard = InstanceGuard::acquire(&path).unwrap();
        let err = InstanceGuard::acquire(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyRunning(_)));
        // The refused attempt must not clobber the owner's pid.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), std::process::id().to_string());
    }

    #[test]
    fn test_stale_lock_file_is_reused() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ferry.lock");
        std::fs::write(&path, "999999999").unwrap();
        let _guard = InstanceGuard::acquire(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), std::process::id().to_string());
    }

    #[test]
    fn test_missing_parent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = InstanceGuard::acquire(temp_dir.path().join("nope/ferry.lock")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Lock(_)));
    }
}
