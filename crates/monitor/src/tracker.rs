//! Retry bookkeeping for files that refuse to settle.
//!
//! A file that is still growing (or is held open by a scanner that never lets
//! go) would otherwise be sampled on every single scan cycle forever. After
//! `limit` unstable cycles the file is set aside for an ignore window, then
//! given another chance.
//!
//! One tracker belongs to exactly one folder monitor, so identical file names
//! in two watched folders never share state.

use std::collections::HashMap;
use std::time::Duration;
use time::UtcDateTime;

/// Where a file name currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Never failed, or reset after a successful copy.
    Untracked,
    /// Failed this many times, still re-checked every cycle.
    ///
    /// Usually below the limit, but a file whose ignore window has lapsed
    /// stays here with its full count (the limit or more) until it either
    /// fails again or is copied.
    Retrying(u32),
    /// Skipped without a re-check until the ignore window lapses.
    Ignored { attempts: u32, since: UtcDateTime },
}

#[derive(Debug, Clone)]
pub struct RetryTracker {
    limit: u32,
    window: time::Duration,
    failures: HashMap<String, u32>,
    ignored: HashMap<String, UtcDateTime>,
}

impl RetryTracker {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window: time::Duration::try_from(window).unwrap_or(time::Duration::MAX),
            failures: HashMap::new(),
            ignored: HashMap::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Counts one more unstable cycle for `name` and returns the new total.
    ///
    /// Reaching the limit starts the ignore window at `now`. The counter is
    /// not reset when a window lapses, so a file that is still unstable after
    /// its second chance goes straight back to being ignored.
    pub fn record_failure(&mut self, name: &str, now: UtcDateTime) -> u32 {
        let attempts = self.failures.entry(name.to_string()).or_insert(0);
        *attempts += 1;
        let attempts = *attempts;
        if attempts >= self.limit {
            self.ignored.insert(name.to_string(), now);
        }
        attempts
    }

    /// Whether `name` should be skipped at `now`.
    ///
    /// Expiry is lazy: a lapsed ignore entry is removed by this check, there
    /// is no background sweep.
    pub fn is_ignored(&mut self, name: &str, now: UtcDateTime) -> bool {
        match self.ignored.get(name) {
            Some(since) if now - *since < self.window => true,
            Some(_) => {
                self.ignored.remove(name);
                false
            },
            None => false,
        }
    }

    /// Forgets everything about `name`.
    pub fn clear(&mut self, name: &str) {
        self.failures.remove(name);
        self.ignored.remove(name);
    }

    pub fn state(&self, name: &str) -> RetryState {
        match (self.failures.get(name), self.ignored.get(name)) {
            (Some(&attempts), Some(&since)) => RetryState::Ignored { attempts, since },
            (Some(&attempts), None) => RetryState::Retrying(attempts),
            (None, _) => RetryState::Untracked,
        }
    }
}
