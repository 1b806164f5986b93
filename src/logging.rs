//! Tracing subscriber setup.
//!
//! Events go to stderr and, when a log directory is given, to a daily-rolling
//! `ferry.log` in that directory as well. `RUST_LOG` overrides the default
//! filter.

use exn::ResultExt;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::error::{ErrorKind, Result};

pub const DEFAULT_FILTER: &str = "ferry=info,ferry_config=info,ferry_monitor=info,ferry_storage=info";
const LOG_FILE_PREFIX: &str = "ferry.log";

/// Keeps the background log file writer alive; drop it last.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

pub fn init(log_dir: Option<&Path>) -> Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let mut guard = None;
    let file = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).or_raise(|| ErrorKind::Logging)?;
            let (writer, worker) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
            guard = Some(worker);
            Some(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .or_raise(|| ErrorKind::Logging)?;
    Ok(LogGuard { _file: guard })
}
