use crate::error::{NotesError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const SETTINGS_FILENAME: &str = "settings.json";

/// The two durable flags that decide where notes live.
///
/// Key names are kept from the store earlier versions wrote, so existing
/// settings files keep working.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(rename = "use_icloud", default)]
    pub use_cloud: bool,

    #[serde(rename = "has_prompted_for_icloud", default)]
    pub has_prompted: bool,
}

pub trait SettingsStore: Send + 'static {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept as `settings.json` in a directory.
pub struct JsonSettingsStore {
    dir: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILENAME)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Settings> {
        let path = self.path();
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&path).map_err(NotesError::Io)?;
        serde_json::from_str(&content).map_err(NotesError::Serialization)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        ensure_dir(&self.dir)?;
        let content = serde_json::to_string_pretty(settings).map_err(NotesError::Serialization)?;
        fs::write(self.path(), content).map_err(NotesError::Io)
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(NotesError::Io)?;
    }
    Ok(())
}

/// In-memory settings. Clones share the same value.
#[derive(Clone, Default)]
pub struct MemSettingsStore {
    inner: Arc<Mutex<Settings>>,
}

impl MemSettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(settings)),
        }
    }

    pub fn current(&self) -> Settings {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SettingsStore for MemSettingsStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.current())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = *settings;
        Ok(())
    }
}
