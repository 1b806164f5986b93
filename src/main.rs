//! ferry: watch folders, copy each settled file to its destination once.

mod error;
mod lock;
mod logging;

use clap::{Args, Parser, Subcommand};
use exn::ResultExt;
use ferry_config::{Config, WatchSpec};
use ferry_monitor::{Context, Supervisor, run_once};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::error::{ErrorKind, Result};
use crate::lock::{DEFAULT_LOCK_FILE, InstanceGuard};

#[derive(Debug, Parser)]
#[command(name = "ferry", version, about = "Poll source folders and copy each settled file exactly once")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch every configured folder until interrupted
    Run(RunArgs),
    /// Validate the configuration and print the resolved folders
    Check(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Configuration file (.json, .toml, .yaml)
    #[arg(short, long, env = "FERRY_CONFIG", default_value = "ferry.json")]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Single-instance lock file
    #[arg(long, default_value = DEFAULT_LOCK_FILE)]
    lock: PathBuf,

    /// Also write daily-rolling log files into this directory
    #[arg(long, env = "FERRY_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Scan every folder once, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_dir = match &cli.command {
        Command::Run(args) => args.log_dir.as_deref(),
        Command::Check(_) => None,
    };
    let _log_guard = match logging::init(log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ferry: {e:?}");
            return ErrorKind::Logging.exit_code();
        },
    };

    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Check(args) => check(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let ErrorKind::AlreadyRunning(_) = &*e {
                println!("another instance is already running");
            } else {
                tracing::error!(error = ?e, "{}", &*e);
            }
            e.exit_code()
        },
    }
}

fn load(path: &Path) -> Result<(Config, Vec<WatchSpec>)> {
    let config = Config::load(path).or_raise(|| ErrorKind::Config)?;
    let specs = config.watch_specs();
    if specs.is_empty() {
        tracing::error!(config = %path.display(), "No folder pair has both a source and a destination");
        exn::bail!(ErrorKind::Config);
    }
    Ok((config, specs))
}

async fn run(args: RunArgs) -> Result<()> {
    let (config, specs) = load(&args.config.config)?;
    let _instance = InstanceGuard::acquire(&args.lock)?;
    watch(&Context::from_config(&config), specs, args.once, shutdown_signal()).await;
    Ok(())
}

/// Scans every folder once with `once`, otherwise keeps monitoring until
/// `shutdown` resolves.
async fn watch(ctx: &Context, specs: Vec<WatchSpec>, once: bool, shutdown: impl Future<Output = ()>) {
    if !once {
        Supervisor::start(ctx, specs).supervise(shutdown).await;
        return;
    }
    for (spec, report) in run_once(ctx, specs).await {
        tracing::info!(
            source = %spec.source.display(),
            listed = report.listed,
            copied = report.copied(),
            listing_failed = report.listing_failed,
            "Scan finished"
        );
    }
}

fn check(args: &ConfigArgs) -> Result<()> {
    let (config, specs) = load(&args.config)?;
    println!("state directory: {}", config.state_dir.display());
    println!("stability: {} samples, {:?} apart", config.stability.samples, config.stability.interval());
    println!("retry: {} attempts, then ignored for {:?}", config.retry.limit, config.retry.ignore_window());
    for spec in specs {
        let extensions = if spec.extensions.is_empty() { "*".to_string() } else { spec.extensions.join(", ") };
        println!(
            "{} -> {} (every {:?}; extensions: {extensions})",
            spec.source.display(),
            spec.destination.display(),
            spec.interval,
        );
    }
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ferry_monitor::clock::ManualClock;
    use std::sync::Arc;

    /// Writes a one-folder config under `root` and returns its path.
    fn write_config(root: &Path, stability: &str) -> PathBuf {
        std::fs::create_dir_all(root.join("in")).unwrap();
        let path = root.join("ferry.json");
        std::fs::write(
            &path,
            format!(
                r#"{{"folders": [{{"source": "{}", "destination": "{}"}}], "state_dir": "{}", "stability": {stability}}}"#,
                root.join("in").display(),
                root.join("out").display(),
                root.join("state").display(),
            ),
        )
        .unwrap();
        path
    }

    fn manual_context(config: &Path) -> (Context, Vec<WatchSpec>) {
        let (config, specs) = load(config).unwrap();
        (Context::from_config(&config).with_clock(Arc::new(ManualClock::fixed())), specs)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["ferry", "run"]).unwrap();
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.lock, PathBuf::from("ferry.lock"));
        assert!(args.log_dir.is_none());
        assert!(!args.once);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "ferry", "run", "--config", "/etc/ferry.toml", "--lock", "/run/ferry.lock", "--log-dir", "/var/log/ferry",
            "--once",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.config.config, PathBuf::from("/etc/ferry.toml"));
        assert_eq!(args.lock, PathBuf::from("/run/ferry.lock"));
        assert_eq!(args.log_dir, Some(PathBuf::from("/var/log/ferry")));
        assert!(args.once);
    }

    #[test]
    fn test_load_rejects_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = load(&temp_dir.path().join("ferry.json")).unwrap_err();
        assert_eq!(&*err, &ErrorKind::Config);
    }

    #[test]
    fn test_load_rejects_config_without_usable_pairs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ferry.json");
        std::fs::write(&path, r#"{"folders": [{"source": "", "destination": "/tmp/out"}]}"#).unwrap();
        let err = load(&path).unwrap_err();
        assert_eq!(&*err, &ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_run_once_copies_and_releases_lock() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let config = write_config(root, r#"{"interval": 0}"#);
        std::fs::write(root.join("in/scan.pdf"), b"scan").unwrap();
        let args = RunArgs {
            config: ConfigArgs { config },
            lock: root.join("ferry.lock"),
            log_dir: None,
            once: true,
        };

        run(args).await.unwrap();
        assert_eq!(std::fs::read(root.join("out/scan.pdf")).unwrap(), b"scan");
        assert!(!root.join("ferry.lock").exists());
    }

    #[tokio::test]
    async fn test_watch_once_with_default_stability() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let config = write_config(root, r#"{}"#);
        std::fs::write(root.join("in/scan.pdf"), b"scan").unwrap();
        let (ctx, specs) = manual_context(&config);

        // Two-second sampling pauses pass instantly on the manual clock.
        watch(&ctx, specs, true, std::future::pending()).await;
        assert_eq!(std::fs::read(root.join("out/scan.pdf")).unwrap(), b"scan");
    }

    #[tokio::test]
    async fn test_watch_runs_until_shutdown() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let config = write_config(root, r#"{}"#);
        std::fs::write(root.join("in/first.pdf"), b"first").unwrap();
        let (ctx, specs) = manual_context(&config);

        let target = root.join("out/first.pdf");
        let shutdown = async {
            while !std::fs::read(&target).is_ok_and(|data| data == b"first") {
                tokio::task::yield_now().await;
            }
        };
        watch(&ctx, specs, false, shutdown).await;
        assert_eq!(std::fs::read(&target).unwrap(), b"first");
    }
}
