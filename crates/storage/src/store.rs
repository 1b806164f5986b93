//! Per-source hash store.
//!
//! Remembers which content digests have already been copied out of one
//! watched source directory, so that the same bytes arriving again (possibly
//! under a different name) are not copied a second time. The store is a flat
//! JSON object of `digest -> last seen (fractional unix seconds)`:
//!
//! ```json
//! {"5d41402abc4b2a76b9719d911017c592...": 1718371200.25}
//! ```
//!
//! The document is rewritten in full on every [`save`](HashStore::save).
//! Entries are never pruned, so the document grows for as long as the source
//! keeps receiving new content. That is a known, accepted tradeoff: pruning
//! would let old content be copied again.

use exn::ResultExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::fs;

use crate::copy::ensure_dir;
use crate::error::{ErrorKind, Result};
use crate::path::encode_source;

/// Digest (lowercase hex) to the time it was last recorded.
pub type ProcessedHashes = BTreeMap<String, f64>;

/// The hash store for one source directory.
#[derive(Debug, Clone, PartialEq)]
pub struct HashStore {
    path: PathBuf,
    hashes: ProcessedHashes,
}

impl HashStore {
    /// Where the document for `source` lives inside `state_dir`.
    pub fn location(state_dir: impl AsRef<Path>, source: impl AsRef<Path>) -> PathBuf {
        state_dir.as_ref().join(format!("hashes_{}.json", encode_source(source)))
    }

    /// Loads the store for `source` from `state_dir`.
    ///
    /// Never fails: a missing document starts an empty store, and a document
    /// that can't be read or parsed is logged and replaced by an empty store
    /// (it will be overwritten on the next successful copy).
    pub async fn load(state_dir: impl AsRef<Path>, source: impl AsRef<Path>) -> Self {
        let path = Self::location(state_dir, source);
        let hashes = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<ProcessedHashes>(&bytes) {
                Ok(hashes) => hashes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Hash store is corrupt; starting empty");
                    ProcessedHashes::new()
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProcessedHashes::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Hash store is unreadable; starting empty");
                ProcessedHashes::new()
            },
        };
        Self { path, hashes }
    }

    /// An empty store that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), hashes: ProcessedHashes::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hashes(&self) -> &ProcessedHashes {
        &self.hashes
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Has content with this digest already been copied from this source?
    pub fn contains(&self, digest: &str) -> bool {
        self.hashes.contains_key(digest)
    }

    /// Records `digest` as seen at `at`, replacing any earlier timestamp.
    pub fn record(&mut self, digest: impl Into<String>, at: UtcDateTime) {
        self.hashes.insert(digest.into(), unix_seconds(at));
    }

    /// Persists the whole store, replacing the previous document.
    ///
    /// Writes to a sibling temporary file first and renames it into place,
    /// so readers only ever see a complete document.
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_dir(parent).await?;
        }
        let document = serde_json::to_vec(&self.hashes).or_raise(|| ErrorKind::Serialization)?;
        let temporary = self.path.with_extension("json.tmp");
        fs::write(&temporary, &document).await.map_err(|e| ErrorKind::from_io(e, &temporary))?;
        fs::rename(&temporary, &self.path).await.map_err(|e| ErrorKind::from_io(e, &self.path))?;
        Ok(())
    }
}

fn unix_seconds(at: UtcDateTime) -> f64 {
    at.unix_timestamp_nanos() as f64 / 1_000_000_000.0
}
