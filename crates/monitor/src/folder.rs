//! The polling loop for one watched folder.

use exn::ResultExt;
use ferry_config::WatchSpec;
use ferry_storage::{HashStore, list_files};

use crate::Context;
use crate::error::ErrorKind;
use crate::pipeline::{Outcome, process_file};
use crate::tracker::RetryTracker;

/// What a [`FolderMonitor`] is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Sleeping,
}

/// Summary of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// The source directory could not be listed; nothing else happened.
    pub listing_failed: bool,
    /// Regular files found in the source directory.
    pub listed: usize,
    /// Files skipped because their extension isn't wanted.
    pub filtered: usize,
    /// One entry per file handed to the pipeline, in processing order.
    pub outcomes: Vec<(String, Outcome)>,
}

impl ScanReport {
    pub fn copied(&self) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| outcome.is_copied()).count()
    }
}

/// Watches one source directory.
///
/// Owns the folder's [`HashStore`] and [`RetryTracker`]; nothing else ever
/// sees them, so two monitors never contend over state.
#[derive(Debug)]
pub struct FolderMonitor {
    spec: WatchSpec,
    ctx: Context,
    store: HashStore,
    tracker: RetryTracker,
    phase: Phase,
}

impl FolderMonitor {
    /// Loads the folder's hash store and gets ready to scan.
    pub async fn start(spec: WatchSpec, ctx: Context) -> Self {
        let store = HashStore::load(&ctx.state_dir, &spec.source).await;
        let tracker = ctx.tracker();
        tracing::info!(
            source = %spec.source.display(),
            destination = %spec.destination.display(),
            interval = ?spec.interval,
            extensions = ?spec.extensions,
            known_hashes = store.len(),
            "Monitoring started"
        );
        Self { spec, ctx, store, tracker, phase: Phase::Scanning }
    }

    pub fn spec(&self) -> &WatchSpec {
        &self.spec
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &HashStore {
        &self.store
    }

    pub fn tracker(&self) -> &RetryTracker {
        &self.tracker
    }

    /// Runs forever: scan, sleep for the interval, repeat.
    pub async fn run(mut self) {
        loop {
            self.step().await;
        }
    }

    /// Advances the scan/sleep cycle by one transition.
    ///
    /// Scanning performs one full pass and returns its report; sleeping waits
    /// out the interval and returns `None`.
    pub async fn step(&mut self) -> Option<ScanReport> {
        match self.phase {
            Phase::Scanning => {
                let report = self.scan_once().await;
                self.phase = Phase::Sleeping;
                Some(report)
            },
            Phase::Sleeping => {
                self.ctx.clock.sleep(self.spec.interval).await;
                self.phase = Phase::Scanning;
                None
            },
        }
    }

    /// One pass over the source directory.
    ///
    /// Files go through the pipeline strictly one after another, in listing
    /// order. A listing failure is logged and the cycle simply ends empty.
    pub async fn scan_once(&mut self) -> ScanReport {
        let mut report = ScanReport::default();
        let files = match list_files(&self.spec.source).await.or_raise(|| ErrorKind::Listing) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(source = %self.spec.source.display(), error = ?e, "Could not list source folder");
                report.listing_failed = true;
                return report;
            },
        };
        report.listed = files.len();

        for file in files {
            if !self.spec.accepts(&file.name) {
                report.filtered += 1;
                continue;
            }
            let outcome =
                process_file(&self.ctx, &self.spec.destination, &mut self.store, &mut self.tracker, &file.path).await;
            report.outcomes.push((file.name, outcome));
        }

        tracing::debug!(listed = report.listed, filtered = report.filtered, copied = report.copied(), "Scan complete");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::testing::CapturedLogs;
    use crate::tracker::RetryState;
    use ferry_config::{Retry, Stability};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn context(state: &Path, clock: Arc<ManualClock>) -> Context {
        Context {
            state_dir: state.to_path_buf(),
            stability: Stability::default(),
            retry: Retry::default(),
            clock,
        }
    }

    struct Fixture {
        temp: TempDir,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempfile::tempdir().unwrap();
            std::fs::create_dir(temp.path().join("in")).unwrap();
            Self { temp, clock: Arc::new(ManualClock::fixed()) }
        }

        fn source(&self) -> std::path::PathBuf {
            self.temp.path().join("in")
        }

        fn destination(&self) -> std::path::PathBuf {
            self.temp.path().join("out")
        }

        fn spec(&self) -> WatchSpec {
            WatchSpec::new(self.source(), self.destination(), INTERVAL)
        }

        async fn monitor(&self, spec: WatchSpec) -> FolderMonitor {
            FolderMonitor::start(spec, context(&self.temp.path().join("state"), self.clock.clone())).await
        }
    }

    #[tokio::test]
    async fn test_scan_copies_every_file() {
        let fx = Fixture::new();
        std::fs::write(fx.source().join("a.pdf"), b"a").unwrap();
        std::fs::write(fx.source().join("b.pdf"), b"b").unwrap();
        std::fs::create_dir(fx.source().join("nested")).unwrap();
        let mut monitor = fx.monitor(fx.spec()).await;

        let report = monitor.scan_once().await;
        assert!(!report.listing_failed);
        assert_eq!(report.listed, 2);
        assert_eq!(report.copied(), 2);
        assert!(fx.destination().join("a.pdf").is_file());
        assert!(fx.destination().join("b.pdf").is_file());
        assert_eq!(monitor.store().len(), 2);
    }

    #[tokio::test]
    async fn test_extension_filter_is_case_insensitive() {
        let fx = Fixture::new();
        std::fs::write(fx.source().join("report.PDF"), b"pdf").unwrap();
        std::fs::write(fx.source().join("report.txt"), b"txt").unwrap();
        let mut monitor = fx.monitor(fx.spec().with_extensions([".pdf"])).await;

        let report = monitor.scan_once().await;
        assert_eq!(report.listed, 2);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].0, "report.PDF");
        assert!(fx.destination().join("report.PDF").is_file());
        assert!(!fx.destination().join("report.txt").exists());
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_empty_cycle() {
        let fx = Fixture::new();
        let spec = WatchSpec::new(fx.temp.path().join("unplugged"), fx.destination(), INTERVAL);
        let mut monitor = fx.monitor(spec).await;

        let logs = CapturedLogs::default();
        let report = {
            let _guard = logs.install();
            monitor.step().await.unwrap()
        };
        assert!(report.listing_failed);
        assert!(report.outcomes.is_empty());
        let errors = logs.at_level("ERROR");
        assert_eq!(errors.len(), 1, "expected one error event, got {errors:#?}");
        assert!(errors[0].contains("Could not list source folder"));

        // The loop carries on: sleep, then scan again once the folder is back.
        assert_eq!(monitor.step().await, None);
        std::fs::create_dir(fx.temp.path().join("unplugged")).unwrap();
        std::fs::write(fx.temp.path().join("unplugged").join("scan.pdf"), b"scan").unwrap();
        let report = monitor.step().await.unwrap();
        assert!(!report.listing_failed);
        assert_eq!(report.copied(), 1);
    }

    #[tokio::test]
    async fn test_alternates_between_scanning_and_sleeping() {
        let fx = Fixture::new();
        let mut monitor = fx.monitor(fx.spec()).await;
        let start = fx.clock.now();

        assert_eq!(monitor.phase(), Phase::Scanning);
        assert!(monitor.step().await.is_some());
        assert_eq!(monitor.phase(), Phase::Sleeping);
        assert!(monitor.step().await.is_none());
        assert_eq!(monitor.phase(), Phase::Scanning);
        assert_eq!(fx.clock.now() - start, time::Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_second_scan_skips_copied_files() {
        let fx = Fixture::new();
        std::fs::write(fx.source().join("a.pdf"), b"a").unwrap();
        let mut monitor = fx.monitor(fx.spec()).await;

        assert_eq!(monitor.scan_once().await.copied(), 1);
        let report = monitor.scan_once().await;
        assert_eq!(report.copied(), 0);
        assert!(matches!(report.outcomes[0].1, Outcome::AlreadyPresent(_)));
    }

    #[tokio::test]
    async fn test_hash_store_survives_restart() {
        let fx = Fixture::new();
        std::fs::write(fx.source().join("a.pdf"), b"same").unwrap();
        let mut monitor = fx.monitor(fx.spec()).await;
        assert_eq!(monitor.scan_once().await.copied(), 1);
        drop(monitor);

        // Same bytes under a new name, seen by a freshly started monitor.
        std::fs::write(fx.source().join("b.pdf"), b"same").unwrap();
        let mut monitor = fx.monitor(fx.spec()).await;
        assert_eq!(monitor.store().len(), 1);
        let report = monitor.scan_once().await;
        let b = report.outcomes.iter().find(|(name, _)| name == "b.pdf").unwrap();
        assert!(matches!(b.1, Outcome::Duplicate { .. }));
        assert!(!fx.destination().join("b.pdf").exists());
    }

    #[tokio::test]
    async fn test_unstable_file_is_tracked_per_monitor() {
        let fx = Fixture::new();
        std::fs::write(fx.source().join("growing.pdf"), b"x").unwrap();
        let path = fx.source().join("growing.pdf");
        let clock = Arc::new(ManualClock::fixed().with_hook(move |_| {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"x").unwrap();
        }));
        let ctx = context(&fx.temp.path().join("state"), clock);
        let mut monitor = FolderMonitor::start(fx.spec(), ctx).await;

        let report = monitor.scan_once().await;
        assert_eq!(report.outcomes[0].1, Outcome::Unstable { attempt: 1 });
        assert_eq!(monitor.tracker().state("growing.pdf"), RetryState::Retrying(1));
    }
}
