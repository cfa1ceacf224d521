use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AcaEnvError;

const PREFERENCES_FILE: &str = "preferences.json";
const CONFIG_DIR_ENV: &str = "ACA_ENV_CONFIG_DIR";

/// How many values of each kind are remembered.
pub const HISTORY_LIMIT: usize = 5;

/// Previously used identifiers, most recent first.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub last_used_app: Vec<String>,
    #[serde(default)]
    pub last_used_resource_group: Vec<String>,
}

impl Preferences {
    /// Put `app` and `group` at the front of their lists, dropping older duplicates.
    pub fn remember(&mut self, app: &str, group: &str) {
        push_recent(&mut self.last_used_app, app);
        push_recent(&mut self.last_used_resource_group, group);
    }
}

fn push_recent(list: &mut Vec<String>, value: &str) {
    list.retain(|v| v != value);
    list.insert(0, value.to_string());
    list.truncate(HISTORY_LIMIT);
}

/// Per-user store for [`Preferences`]. Every failure here is logged and swallowed.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `$ACA_ENV_CONFIG_DIR/preferences.json`, or the platform config directory.
    pub fn open_default() -> Result<Self, AcaEnvError> {
        Ok(Self::new(default_path()?))
    }

    /// Empty preferences if the file is missing or unreadable.
    pub fn load(&self) -> Preferences {
        if !self.path.exists() {
            return Preferences::default();
        }
        match self.read() {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring unreadable preferences: {}", e);
                Preferences::default()
            }
        }
    }

    /// Record `app` and `group` as the most recently used values and save.
    pub fn update(&self, app: &str, group: &str) {
        let mut prefs = self.load();
        prefs.remember(app, group);
        match self.write(&prefs) {
            Ok(()) => debug!(path = %self.path.display(), "saved preferences"),
            Err(e) => warn!(path = %self.path.display(), "could not save preferences: {}", e),
        }
    }

    fn read(&self) -> Result<Preferences, AcaEnvError> {
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write(&self, prefs: &Preferences) -> Result<(), AcaEnvError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

fn default_path() -> Result<PathBuf, AcaEnvError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir).join(PREFERENCES_FILE));
    }
    let dirs = ProjectDirs::from("", "", "aca-env").ok_or(AcaEnvError::NoConfigDir)?;
    Ok(dirs.config_dir().join(PREFERENCES_FILE))
}
