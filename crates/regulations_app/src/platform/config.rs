use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use regulations_client::{ClientSettings, DEFAULT_BASE_URL};
use regulations_logging::LogDestination;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "regulations.ron";

/// Front-end settings read from `regulations.ron`. Absent fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 1000,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            log_destination: LogDestination::File,
        }
    }
}

impl AppConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `./regulations.ron` is used
    /// when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = PathBuf::from(CONFIG_FILENAME);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        ron::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Client settings, with `base_url_override` taking precedence over the file.
    pub fn client_settings(&self, base_url_override: Option<&str>) -> anyhow::Result<ClientSettings> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        let base_url = base_url_override.unwrap_or(&self.base_url);
        let settings = ClientSettings::with_base_url(base_url)
            .with_context(|| format!("invalid backend url {base_url:?}"))?;
        Ok(ClientSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..settings
        })
    }
}
