use crate::defaults;
use crate::error::{ErrorKind, Result};
use crate::spec::WatchSpec;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables with this prefix override keys from the file.
/// Nested keys are separated with a double underscore (`FERRY_RETRY__LIMIT`).
pub const ENV_PREFIX: &str = "FERRY_";

/// The whole configuration document.
///
/// The keys used by earlier deployments (`segundos_intervalo_scan`,
/// `pastas_monitoradas`, `origem`, `destino`, `extensoes`) are accepted as
/// aliases so existing files keep working unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds to wait between two scans of the same folder.
    #[serde(default = "defaults::scan_interval", alias = "segundos_intervalo_scan")]
    pub scan_interval: u64,
    /// Watched folder pairs, in the order they should be started.
    #[serde(alias = "pastas_monitoradas")]
    pub folders: Vec<FolderPair>,
    /// Directory holding one hash store document per source folder.
    #[serde(default = "defaults::state_dir")]
    pub state_dir: PathBuf,
    #[serde(default)]
    pub stability: Stability,
    #[serde(default)]
    pub retry: Retry,
}

/// One configured source → destination pairing, as written in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderPair {
    #[serde(default, alias = "origem")]
    pub source: PathBuf,
    #[serde(default, alias = "destino")]
    pub destination: PathBuf,
    /// Allowed file name suffixes (`.pdf`, `.tif`). Absent or empty means
    /// every file is a candidate.
    #[serde(default, alias = "extensoes")]
    pub extensions: Option<Vec<String>>,
}

/// How a file is judged to have finished being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stability {
    #[serde(default = "defaults::stability_samples")]
    pub samples: u32,
    /// Seconds between samples.
    #[serde(default = "defaults::stability_interval")]
    pub interval: u64,
}
impl Default for Stability {
    fn default() -> Self {
        Self {
            samples: defaults::STABILITY_SAMPLES,
            interval: defaults::STABILITY_INTERVAL,
        }
    }
}
impl Stability {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

/// When a repeatedly unstable file is set aside, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retry {
    #[serde(default = "defaults::retry_limit")]
    pub limit: u32,
    /// Seconds.
    #[serde(default = "defaults::ignore_window")]
    pub ignore_window: u64,
}
impl Default for Retry {
    fn default() -> Self {
        Self {
            limit: defaults::RETRY_LIMIT,
            ignore_window: defaults::IGNORE_WINDOW,
        }
    }
}
impl Retry {
    pub fn ignore_window(&self) -> Duration {
        Duration::from_secs(self.ignore_window)
    }
}

impl Config {
    /// Loads, merges and validates the configuration.
    ///
    /// The file format is picked from the extension (`.json`, `.toml`,
    /// `.yaml`/`.yml`). Scalar keys can then be overridden from the
    /// environment, see [`ENV_PREFIX`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        let figment = match extension.as_deref() {
            Some("json") => Figment::new().merge(Json::file_exact(path)),
            Some("toml") => Figment::new().merge(Toml::file_exact(path)),
            Some("yaml" | "yml") => Figment::new().merge(Yaml::file_exact(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        };
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts and validates a configuration from an already assembled
    /// [`Figment`]. Mostly useful for tests and embedding.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| ErrorKind::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde can't express.
    pub fn validate(&self) -> Result<()> {
        if self.scan_interval == 0 {
            exn::bail!(ErrorKind::Invalid("scan_interval must be greater than zero".to_string()));
        }
        if self.folders.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one folder pair must be configured".to_string()));
        }
        // Two samples are the minimum needed to compare sizes at all.
        if self.stability.samples < 2 {
            exn::bail!(ErrorKind::Invalid("stability.samples must be at least 2".to_string()));
        }
        if self.retry.limit == 0 {
            exn::bail!(ErrorKind::Invalid("retry.limit must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// Resolves configured folder pairs into [`WatchSpec`]s.
    ///
    /// Pairs missing either a source or a destination are skipped with a
    /// warning instead of failing the whole configuration.
    pub fn watch_specs(&self) -> Vec<WatchSpec> {
        self.folders
            .iter()
            .enumerate()
            .filter_map(|(index, pair)| {
                if pair.source.as_os_str().is_empty() || pair.destination.as_os_str().is_empty() {
                    tracing::warn!(index, "Skipping folder pair without both a source and a destination");
                    return None;
                }
                let spec = WatchSpec::new(&pair.source, &pair.destination, self.scan_interval())
                    .with_extensions(pair.extensions.iter().flatten());
                Some(spec)
            })
            .collect()
    }
}
