//! Watching folders and copying their files exactly once.
//!
//! The moving parts, from the bottom up:
//!
//! - [`is_stable`] samples a file's size until it stops changing.
//! - [`RetryTracker`] sets aside files that keep failing that check.
//! - [`process_file`] runs one candidate through every gate and copies it.
//! - [`FolderMonitor`] polls one source directory and feeds its files to the
//!   pipeline, sequentially, forever.
//! - [`Supervisor`] runs one monitor task per configured folder.
//!
//! Everything that waits does so through the [`Clock`] in the shared
//! [`Context`].

pub mod clock;
pub mod error;
mod folder;
mod pipeline;
mod stability;
mod supervisor;
#[cfg(test)]
mod testing;
mod tracker;

use ferry_config::{Config, Retry, Stability};
use std::path::PathBuf;
use std::sync::Arc;

pub use crate::clock::{Clock, ClockHandle, SystemClock};
pub use crate::folder::{FolderMonitor, Phase, ScanReport};
pub use crate::pipeline::{Outcome, process_file};
pub use crate::stability::{FileCandidate, is_stable};
pub use crate::supervisor::{Supervisor, run_once};
pub use crate::tracker::{RetryState, RetryTracker};

/// Settings shared, read-only, by every folder monitor.
#[derive(Clone)]
pub struct Context {
    /// Where each source's hash store document lives.
    pub state_dir: PathBuf,
    pub stability: Stability,
    pub retry: Retry,
    pub clock: ClockHandle,
}

impl Context {
    pub fn from_config(config: &Config) -> Self {
        Self {
            state_dir: config.state_dir.clone(),
            stability: config.stability,
            retry: config.retry,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: ClockHandle) -> Self {
        self.clock = clock;
        self
    }

    /// A fresh, empty tracker configured for this context.
    pub fn tracker(&self) -> RetryTracker {
        RetryTracker::new(self.retry.limit, self.retry.ignore_window())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("state_dir", &self.state_dir)
            .field("stability", &self.stability)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
