//! Time source used by the monitor.
//!
//! Every sleep and every "what time is it" question goes through a [`Clock`],
//! so the stability detector and the ignore window can be exercised in tests
//! without actually waiting.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use time::UtcDateTime;

pub type ClockHandle = Arc<dyn Clock>;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;

    /// Suspends the calling task (never the whole thread) for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time and real tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(any(test, feature = "mock"))]
pub use self::manual::ManualClock;

#[cfg(any(test, feature = "mock"))]
mod manual {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Hook = Box<dyn Fn(usize) + Send + Sync>;

    /// A clock that only moves when told to.
    ///
    /// [`sleep`](Clock::sleep) returns immediately after advancing the clock
    /// by the requested duration and running the optional hook, which gets
    /// the number of sleeps so far. Tests use the hook to change the world
    /// "while" the monitor waits, e.g. appending to a file between two size
    /// samples.
    pub struct ManualClock {
        now: Mutex<UtcDateTime>,
        sleeps: AtomicUsize,
        hook: Option<Hook>,
    }

    impl ManualClock {
        pub fn new(start: UtcDateTime) -> Self {
            Self {
                now: Mutex::new(start),
                sleeps: AtomicUsize::new(0),
                hook: None,
            }
        }

        /// Starts at a fixed, arbitrary instant (2024-06-14T12:00:00Z).
        pub fn fixed() -> Self {
            Self::new(UtcDateTime::from_unix_timestamp(1_718_366_400).expect("fixed timestamp is valid"))
        }

        pub fn with_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
            self.hook = Some(Box::new(hook));
            self
        }

        pub fn advance(&self, duration: Duration) {
            let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            *now += duration;
        }

        /// How many times [`sleep`](Clock::sleep) has been called.
        pub fn sleeps(&self) -> usize {
            self.sleeps.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> UtcDateTime {
            *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        async fn sleep(&self, duration: Duration) {
            self.advance(duration);
            let count = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(hook) = &self.hook {
                hook(count);
            }
            // Stay cooperative: loops driven by this clock never truly wait.
            tokio::task::yield_now().await;
        }
    }
}
