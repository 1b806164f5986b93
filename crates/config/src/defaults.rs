//! Default values for optional configuration keys.

use std::path::PathBuf;

/// Seconds between two scans of the same folder.
pub(crate) const SCAN_INTERVAL: u64 = 60;
/// Size samples taken while waiting for a file to settle.
pub(crate) const STABILITY_SAMPLES: u32 = 3;
/// Seconds between two size samples.
pub(crate) const STABILITY_INTERVAL: u64 = 2;
/// Unstable cycles tolerated before a file is ignored.
pub(crate) const RETRY_LIMIT: u32 = 3;
/// Seconds an ignored file is left alone before being re-evaluated.
pub(crate) const IGNORE_WINDOW: u64 = 600;

pub(crate) fn scan_interval() -> u64 {
    SCAN_INTERVAL
}

pub(crate) fn stability_samples() -> u32 {
    STABILITY_SAMPLES
}

pub(crate) fn stability_interval() -> u64 {
    STABILITY_INTERVAL
}

pub(crate) fn retry_limit() -> u32 {
    RETRY_LIMIT
}

pub(crate) fn ignore_window() -> u64 {
    IGNORE_WINDOW
}

/// Hash stores live in the platform data directory, or `./hashes` when the
/// platform doesn't have one (no home directory, minimal containers).
pub(crate) fn state_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "ferry")
        .map(|dirs| dirs.data_dir().join("hashes"))
        .unwrap_or_else(|| PathBuf::from("hashes"))
}
