//! Runs one folder monitor per watched folder.

use ferry_config::WatchSpec;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use tokio::task::{Id, JoinSet};
use tracing::Instrument;

use crate::Context;
use crate::folder::{FolderMonitor, ScanReport};

fn folder_span(spec: &WatchSpec) -> tracing::Span {
    tracing::info_span!(
        "folder",
        source = %spec.source.display(),
        destination = %spec.destination.display()
    )
}

/// Owns the folder monitor tasks.
///
/// Monitors are independent: one that stops (which only happens if it
/// panics) is reported and left stopped, while the others carry on.
#[derive(Debug)]
pub struct Supervisor {
    tasks: JoinSet<()>,
    folders: HashMap<Id, PathBuf>,
}

impl Supervisor {
    /// Spawns a monitor task for every spec. Must be called from within a
    /// tokio runtime.
    pub fn start(ctx: &Context, specs: impl IntoIterator<Item = WatchSpec>) -> Self {
        let mut supervisor = Self { tasks: JoinSet::new(), folders: HashMap::new() };
        for spec in specs {
            let source = spec.source.clone();
            let span = folder_span(&spec);
            let ctx = ctx.clone();
            supervisor.spawn(source, async move { FolderMonitor::start(spec, ctx).await.run().await }.instrument(span));
        }
        tracing::info!(folders = supervisor.len(), "Supervisor started");
        supervisor
    }

    fn spawn(&mut self, source: PathBuf, task: impl Future<Output = ()> + Send + 'static) {
        let handle = self.tasks.spawn(task);
        self.folders.insert(handle.id(), source);
    }

    /// Number of monitors still running.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Keeps the monitors running until `shutdown` completes, then aborts
    /// whatever is left without waiting for in-flight copies.
    ///
    /// If every monitor has stopped, this just waits for `shutdown`. Returns
    /// the sources whose monitors stopped on their own.
    pub async fn supervise(mut self, shutdown: impl Future<Output = ()>) -> Vec<PathBuf> {
        let mut stopped = Vec::new();
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                Some(joined) = self.tasks.join_next_with_id(), if !self.tasks.is_empty() => {
                    let (id, panicked) = match joined {
                        Ok((id, ())) => (id, false),
                        Err(e) => (e.id(), e.is_panic()),
                    };
                    let source = self.folders.remove(&id).unwrap_or_default();
                    if panicked {
                        tracing::error!(source = %source.display(), "Folder monitor panicked; it will not be restarted");
                    } else {
                        tracing::error!(source = %source.display(), "Folder monitor stopped; it will not be restarted");
                    }
                    stopped.push(source);
                },
            }
        }
        tracing::info!(remaining = self.tasks.len(), "Shutting down folder monitors");
        self.tasks.shutdown().await;
        stopped
    }
}

/// Runs exactly one scan cycle for every spec, all folders concurrently,
/// and returns the reports in the order the specs were given.
///
/// A folder whose cycle panicked is logged and left out.
pub async fn run_once(ctx: &Context, specs: impl IntoIterator<Item = WatchSpec>) -> Vec<(WatchSpec, ScanReport)> {
    let mut tasks = JoinSet::new();
    for (index, spec) in specs.into_iter().enumerate() {
        let span = folder_span(&spec);
        let ctx = ctx.clone();
        tasks.spawn(
            async move {
                let mut monitor = FolderMonitor::start(spec, ctx).await;
                let report = monitor.scan_once().await;
                (index, monitor.spec().clone(), report)
            }
            .instrument(span),
        );
    }

    let mut reports = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => tracing::error!(error = %e, "Folder scan did not complete"),
        }
    }
    reports.sort_by_key(|(index, _, _)| *index);
    reports.into_iter().map(|(_, spec, report)| (spec, report)).collect()
}
