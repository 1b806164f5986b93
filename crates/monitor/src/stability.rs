//! Has a file finished being written?
//!
//! There is no portable way to ask, so we guess: sample the size a few times
//! with a pause in between and call the file stable as soon as two consecutive
//! samples agree. A file deleted and replaced by another of the same size in
//! between two samples looks stable too; that ambiguity is accepted.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::clock::Clock;

/// A file being considered for copying, alive for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    /// Sizes observed by [`is_stable`], oldest first.
    pub samples: Vec<u64>,
}

impl FileCandidate {
    pub fn new(path: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            name: name.into(),
            samples: Vec::new(),
        }
    }
}

/// Samples the candidate's size up to `samples` times, `interval` apart.
///
/// Returns `true` as soon as two consecutive samples are equal (an empty file
/// that stays empty counts). Returns `false` if every sample differed from
/// the previous one, or if the file can't be stat'ed at any point (deleted,
/// permissions changed). Observed sizes are appended to
/// [`FileCandidate::samples`].
///
/// The pause happens through `clock`, so it only ever suspends the calling
/// task.
pub async fn is_stable(candidate: &mut FileCandidate, samples: u32, interval: Duration, clock: &dyn Clock) -> bool {
    let mut previous = None;
    for _ in 0..samples {
        let size = match fs::metadata(&candidate.path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::debug!(path = %candidate.path.display(), error = %e, "File became unreadable while sampling");
                return false;
            },
        };
        candidate.samples.push(size);
        if previous == Some(size) {
            return true;
        }
        previous = Some(size);
        clock.sleep(interval).await;
    }
    false
}
