use std::path::{Path, PathBuf};
use std::time::Duration;

/// A resolved, immutable source → destination pairing driven by one folder
/// monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Time to wait between the end of one scan and the start of the next.
    pub interval: Duration,
    /// Lowercased file name suffixes. Empty accepts every file.
    pub extensions: Vec<String>,
}

impl WatchSpec {
    pub fn new(source: impl AsRef<Path>, destination: impl AsRef<Path>, interval: Duration) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
            interval,
            extensions: Vec::new(),
        }
    }

    /// Restricts the spec to file names ending in one of `extensions`,
    /// compared case-insensitively.
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Whether a file called `name` is a candidate for copying.
    ///
    /// This is a plain suffix match: `.pdf` accepts `REPORT.PDF`, and so would
    /// `pdf` (which also accepts `notapdf`).
    pub fn accepts(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let name = name.to_lowercase();
        self.extensions.iter().any(|extension| name.ends_with(extension.as_str()))
    }
}
