//! The copy-once pipeline for a single candidate file.
//!
//! Each step is a gate; the first one that says "not now" ends the run:
//!
//! 1. **Already at destination**: something with the same name already
//!    exists there (copied by an earlier run, or by hand, or a symlink).
//!    Nothing is logged.
//! 2. **Ignored**: the name is inside its ignore window.
//! 3. The destination directory is created if needed.
//! 4. **Unstable**: the size is still changing. Counts towards the retry
//!    limit and may start an ignore window.
//! 5. **Unreadable**: the content can't be hashed (vanished, locked).
//! 6. **Duplicate**: content with this digest was already copied from this
//!    source, possibly under another name.
//! 7. The file is copied (timestamps and permission bits preserved), its
//!    digest recorded and the hash store persisted before returning, and
//!    the name's retry state is cleared.
//!
//! Log events follow the order detected → verified → copying → copied.

use exn::ResultExt;
use ferry_storage::{HashStore, basename, copy_preserving, destination_for, ensure_dir, hash_file};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::stability::{FileCandidate, is_stable};
use crate::tracker::RetryTracker;

/// How a single [`process_file`] run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The destination already holds a file with this name.
    AlreadyPresent(PathBuf),
    /// The name is inside its ignore window; not even sampled.
    Ignored,
    /// The size was still changing; this was unstable cycle number `attempt`.
    Unstable { attempt: u32 },
    /// The size was still changing and the retry limit has now been reached.
    NowIgnored { attempts: u32 },
    /// The content could not be read for hashing.
    Unreadable,
    /// Content with this digest was copied from this source before.
    Duplicate { digest: String },
    /// Copied.
    Copied { destination: PathBuf, digest: String, bytes: u64 },
    /// Something unexpected went wrong; the cause has been logged.
    Failed,
}

impl Outcome {
    pub fn is_copied(&self) -> bool {
        matches!(self, Self::Copied { .. })
    }
}

/// Runs the pipeline for the file at `source`, copying it into `destination`
/// at most once.
///
/// Never fails: every problem ends in a log event and an [`Outcome`], so one
/// bad file can't stop the rest of a scan.
pub async fn process_file(
    ctx: &Context,
    destination: &Path,
    store: &mut HashStore,
    tracker: &mut RetryTracker,
    source: &Path,
) -> Outcome {
    match process_file_inner(ctx, destination, store, tracker, source).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(path = %source.display(), retryable = e.is_retryable(), error = ?e, "Failed to copy file");
            Outcome::Failed
        },
    }
}

async fn process_file_inner(
    ctx: &Context,
    destination: &Path,
    store: &mut HashStore,
    tracker: &mut RetryTracker,
    source: &Path,
) -> Result<Outcome> {
    let name = basename(source).or_raise(|| ErrorKind::Candidate)?;
    let target = destination_for(source, destination).or_raise(|| ErrorKind::Candidate)?;

    // Any entry counts, symlinks included: following a link here would let
    // the copy write wherever it points.
    match fs::symlink_metadata(&target).await {
        Ok(_) => return Ok(Outcome::AlreadyPresent(target)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => return Err(e).or_raise(|| ErrorKind::Destination),
    }

    if tracker.is_ignored(&name, ctx.clock.now()) {
        return Ok(Outcome::Ignored);
    }

    ensure_dir(destination).await.or_raise(|| ErrorKind::Destination)?;
    tracing::info!(file = %name, "File detected");

    let mut candidate = FileCandidate::new(source, &name);
    if !is_stable(&mut candidate, ctx.stability.samples, ctx.stability.interval(), ctx.clock.as_ref()).await {
        let attempts = tracker.record_failure(&name, ctx.clock.now());
        if attempts >= tracker.limit() {
            tracing::warn!(file = %name, attempts, "File ignored after repeated unstable checks");
            return Ok(Outcome::NowIgnored { attempts });
        }
        tracing::warn!(path = %source.display(), attempt = attempts, sizes = ?candidate.samples, "File is unstable");
        return Ok(Outcome::Unstable { attempt: attempts });
    }

    let digest = match hash_file(source).await {
        Ok(digest) => digest,
        Err(e) => {
            tracing::warn!(file = %name, error = ?e, "Could not hash file");
            return Ok(Outcome::Unreadable);
        },
    };
    tracing::info!(file = %name, %digest, "File verified");

    if store.contains(&digest) {
        tracing::info!(file = %name, %digest, "Content already copied from this source; skipping");
        return Ok(Outcome::Duplicate { digest });
    }

    tracing::info!(file = %name, target = %target.display(), "Copying file");
    let bytes = match copy_preserving(source, &target).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // A half-written target would pass the "already present" gate on
            // every later cycle and never be replaced.
            _ = fs::remove_file(&target).await;
            return Err(e).or_raise(|| ErrorKind::Copy);
        },
    };

    store.record(digest.clone(), ctx.clock.now());
    if let Err(e) = store.save().await {
        tracing::warn!(path = %store.path().display(), error = ?e, "Could not persist hash store");
    }
    tracker.clear(&name);

    tracing::info!(file = %name, bytes, "File copied successfully");
    Ok(Outcome::Copied { destination: target, digest, bytes })
}
