use crate::error::{NotesError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Configuration for notes, stored in `<config dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotesConfig {
    /// Overrides the local notes directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<PathBuf>,

    /// Directory kept in sync by the cloud client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_dir: Option<PathBuf>,

    /// Command run with a path appended to materialize a placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_command: Option<String>,

    /// How often the cloud directory is searched
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            local_dir: None,
            cloud_dir: None,
            download_command: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Keys accepted by the `config` command.
pub const CONFIG_KEYS: &[&str] = &["cloud-dir", "download-command", "poll-interval"];

impl NotesConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(NotesError::Io)?;
        let config: NotesConfig =
            serde_json::from_str(&content).map_err(NotesError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(NotesError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(NotesError::Serialization)?;
        fs::write(config_path, content).map_err(NotesError::Io)?;
        Ok(())
    }

    /// Current value of a `config` key, `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match key {
            "cloud-dir" => Ok(self
                .cloud_dir
                .as_ref()
                .map(|d| d.display().to_string())),
            "download-command" => Ok(self.download_command.clone()),
            "poll-interval" => Ok(Some(self.poll_interval_ms.to_string())),
            other => Err(unknown_key(other)),
        }
    }

    /// Sets a `config` key. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "cloud-dir" => {
                self.cloud_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "download-command" => {
                self.download_command = (!value.is_empty()).then(|| value.to_string());
            }
            "poll-interval" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| NotesError::Api(format!("Invalid poll interval: {}", value)))?;
                if ms == 0 {
                    return Err(NotesError::Api("Poll interval must be positive".to_string()));
                }
                self.poll_interval_ms = ms;
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> NotesError {
    NotesError::Api(format!(
        "Unknown config key: {} (expected one of {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}
