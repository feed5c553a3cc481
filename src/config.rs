use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::staging::Mode;

/// Top-level configuration for the metaclean client.
///
/// Controls where the metadata service lives, how long a submission may
/// run, where downloads are saved, and the trigger labels for each form.
///
/// # Loading
///
/// ```rust,no_run
/// use metaclean::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.server.base_url = "http://localhost:5000".into();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Metadata service location and request limits.
    pub server: ServerConfig,
    /// Where sanitized downloads are written.
    pub output: OutputConfig,
    /// Resting and busy labels of the trigger controls.
    pub labels: LabelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL the `/api/analyze` and `/api/remove` paths are joined onto.
    pub base_url: String,
    /// Upper bound on a whole submission. `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory downloads are saved into.
    pub download_dir: PathBuf,
}

/// Trigger control labels for one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerLabels {
    pub resting: String,
    pub busy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub analyze: TriggerLabels,
    pub remove: TriggerLabels,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://127.0.0.1:5000".to_string(),
                request_timeout_secs: Some(300),
            },
            output: OutputConfig {
                download_dir: PathBuf::from("."),
            },
            labels: LabelConfig::default(),
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            analyze: TriggerLabels {
                resting: "Analyze Metadata Now".to_string(),
                busy: "Analyzing...".to_string(),
            },
            remove: TriggerLabels {
                resting: "Remove Metadata Now".to_string(),
                busy: "Processing...".to_string(),
            },
        }
    }
}

impl LabelConfig {
    pub fn for_mode(&self, mode: Mode) -> &TriggerLabels {
        match mode {
            Mode::Single => &self.analyze,
            Mode::Multi => &self.remove,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// `config.json` beside the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
