//! Binary Error Types
//!
//! The only place where failures are fatal. Each variant maps onto a process
//! exit code in `main`.

use derive_more::{Display, Error};
use std::path::PathBuf;
use std::process::ExitCode;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration could not be loaded or is invalid.
    #[display("invalid configuration")]
    Config,
    /// The tracing subscriber or its log file could not be set up.
    #[display("logging setup failed")]
    Logging,
    /// Another process holds the instance lock.
    #[display("another instance is already running (lock: {})", _0.display())]
    AlreadyRunning(#[error(not(source))] PathBuf),
    /// The instance lock file could not be created or locked.
    #[display("instance lock unavailable: {}", _0.display())]
    Lock(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            // Finding the job already in hand is not a failure.
            Self::AlreadyRunning(_) => ExitCode::SUCCESS,
            Self::Config => ExitCode::from(2),
            Self::Logging | Self::Lock(_) => ExitCode::FAILURE,
        }
    }
}
