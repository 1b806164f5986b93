//! Configuration for ferry.
//!
//! A configuration document lists the folder pairs to watch plus a handful of
//! tuning knobs. It is read once at startup with [figment], validated, and
//! resolved into one [`WatchSpec`] per usable folder pair.
//!
//! ```json
//! {
//!     "scan_interval": 60,
//!     "state_dir": "/var/lib/ferry",
//!     "folders": [
//!         {"source": "/srv/scanner", "destination": "/mnt/archive", "extensions": [".pdf"]}
//!     ],
//!     "stability": {"samples": 3, "interval": 2},
//!     "retry": {"limit": 3, "ignore_window": 600}
//! }
//! ```

mod defaults;
pub mod error;
mod model;
mod spec;

pub use crate::model::{Config, ENV_PREFIX, FolderPair, Retry, Stability};
pub use crate::spec::WatchSpec;
