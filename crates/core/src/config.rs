//! Watcher configuration.
//!
//! Settings are layered from built-in defaults, a TOML file and `DZSM_*`
//! environment variables (highest precedence). The file location defaults to
//! the user's config directory and can be overridden with `DZSM_CONFIG`.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::ProcessRole;

/// Environment variable that points at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "DZSM_CONFIG";

/// Relative location of the config file under the user's config directory.
pub const DEFAULT_CONFIG_FILE: &str = "dzsm/watcher.toml";

/// File name of the tick artifact written in file-sink mode.
pub const TICK_ARTIFACT: &str = "DZSM-TICK.json";

const DEFAULT_REPORT_INTERVAL_SECS: f64 = 30.0;
const DEFAULT_DEFERRED_START_SECS: f64 = 120.0;
const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 30.0;

const DEFAULT_CONFIG: &str = r#"# DZSM watcher configuration.
# Every key can be overridden with a DZSM_<KEY> environment variable.

# Collector base address, used when use_api_for_report = true.
host = "http://127.0.0.1:8080"
# Shared key sent as the `key` query parameter.
key = ""
# Seconds between two live-state reports.
report_interval = 30.0
# true: POST reports to <host>/ingamereport, false: overwrite DZSM-TICK.json.
use_api_for_report = false
# Run the one-time catalog dump after the deferred start.
data_dump = true
# Emit per-tick diagnostics.
debug = false

role = "server"
profile_dir = "profiles"
deferred_start_secs = 120.0
# Client-side timeout for one report POST; 0 disables it.
request_timeout_secs = 30.0
# JSON export of the engine config database, read by the catalog dump.
config_export = "profiles/dzsm-config.json"
# Live world snapshot rewritten by the engine side.
world_snapshot = "profiles/dzsm-world.json"
"#;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// The report interval must be a representable, non-zero number of seconds.
    #[error("report_interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
    /// Timer delays must be representable and non-negative.
    #[error("{name} must be a non-negative number of seconds, got {value}")]
    InvalidDelay {
        /// Offending key.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// HTTP reporting needs a collector address.
    #[error("use_api_for_report is set but host is empty")]
    MissingHost,
    /// The collector address is not an absolute http(s) URL.
    #[error("invalid collector host {host:?}: {reason}")]
    InvalidHost {
        /// Configured host string.
        host: String,
        /// Parser or scheme complaint.
        reason: String,
    },
}

/// How completed reports leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// POST to the remote collector.
    Http,
    /// Overwrite the local tick artifact.
    File,
}

/// Runtime configuration for the watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Collector base address.
    pub host: String,
    /// Shared key passed to the collector.
    pub key: String,
    /// Seconds between reports.
    pub report_interval: f64,
    /// Select the HTTP sink instead of the file sink.
    pub use_api_for_report: bool,
    /// Run the one-time catalog dump.
    pub data_dump: bool,
    /// Raise diagnostics to debug level.
    pub debug: bool,
    /// Role of this process; only servers run the watcher.
    pub role: ProcessRole,
    /// Persistent storage for artifacts.
    pub profile_dir: PathBuf,
    /// Delay before the first query, letting the world settle.
    pub deferred_start_secs: f64,
    /// Client-side timeout for a single report POST. Zero disables it.
    pub request_timeout_secs: f64,
    /// JSON export of the config database used for catalog dumps.
    pub config_export: Option<PathBuf>,
    /// JSON file holding the current live world snapshot.
    pub world_snapshot: PathBuf,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            key: String::new(),
            report_interval: DEFAULT_REPORT_INTERVAL_SECS,
            use_api_for_report: false,
            data_dump: true,
            debug: false,
            role: ProcessRole::Server,
            profile_dir: PathBuf::from("profiles"),
            deferred_start_secs: DEFAULT_DEFERRED_START_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            config_export: Some(PathBuf::from("profiles/dzsm-config.json")),
            world_snapshot: PathBuf::from("profiles/dzsm-world.json"),
        }
    }
}

impl WatcherConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` layered under `DZSM_*` variables.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::from(path.as_ref())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("DZSM"))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if seconds(self.report_interval).map_or(true, |period| period.is_zero()) {
            return Err(ConfigError::InvalidInterval(self.report_interval));
        }
        for (name, value) in [
            ("deferred_start_secs", self.deferred_start_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if seconds(value).is_none() {
                return Err(ConfigError::InvalidDelay { name, value });
            }
        }
        if self.use_api_for_report {
            let host = self.host.trim();
            if host.is_empty() {
                return Err(ConfigError::MissingHost);
            }
            let url = reqwest::Url::parse(host).map_err(|err| ConfigError::InvalidHost {
                host: host.to_string(),
                reason: err.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidHost {
                    host: host.to_string(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                });
            }
        }
        Ok(())
    }

    /// Selected sink, fixed for the process lifetime.
    pub fn sink_mode(&self) -> SinkMode {
        if self.use_api_for_report {
            SinkMode::Http
        } else {
            SinkMode::File
        }
    }

    /// Cadence of the repeating report timer. Never zero; an unvalidated
    /// value that does not convert falls back to the default.
    pub fn report_interval(&self) -> Duration {
        seconds(self.report_interval)
            .filter(|period| !period.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_REPORT_INTERVAL_SECS))
    }

    /// Delay of the one-shot start timer.
    pub fn deferred_start(&self) -> Duration {
        seconds(self.deferred_start_secs)
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_DEFERRED_START_SECS))
    }

    /// Timeout applied to each report POST, `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        let timeout = seconds(self.request_timeout_secs)
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_SECS));
        (!timeout.is_zero()).then_some(timeout)
    }

    /// Path overwritten by the file sink.
    pub fn tick_artifact_path(&self) -> PathBuf {
        self.profile_dir.join(TICK_ARTIFACT)
    }
}

/// Seconds as a `Duration`; `None` for negative, non-finite or overflowing input.
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

/// Resolve the config file path, honouring `DZSM_CONFIG`.
pub fn config_path() -> PathBuf {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_CONFIG_FILE)
}

/// Config file resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Location of the file.
    pub path: PathBuf,
    /// Whether the commented default was written during this call.
    pub created: bool,
}

/// Write the commented default config file if none exists yet.
///
/// Runs before logging is set up, so callers report `created` themselves.
pub fn ensure_default_config() -> anyhow::Result<ConfigFile> {
    let path = config_path();
    let created = write_default_config(&path)?;
    Ok(ConfigFile { path, created })
}

fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    Ok(true)
}
