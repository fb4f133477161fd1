// Configuration
// Resolves data and log locations from the environment

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use log::LevelFilter;

use crate::error::{SettingsError, SettingsResult};
use crate::services::{EventSink, JsonFileBackend, PreferencesStore};

pub const ENV_DATA_DIR: &str = "RECORDER_DATA_DIR";
pub const ENV_LOG_DIR: &str = "RECORDER_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "RECORDER_LOG_LEVEL";
pub const ENV_LOG_RETENTION_DAYS: &str = "RECORDER_LOG_RETENTION_DAYS";

const PREFERENCES_FILE: &str = "preferences.json";

fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .map(|dir| dir.join("recorder"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_log_retention_days() -> u32 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: LevelFilter,
    /// Days to keep old log files; 0 keeps them forever
    pub log_retention_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            log_level: LevelFilter::Info,
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> SettingsResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SettingsResult<Self> {
        let data_dir = lookup(ENV_DATA_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let log_dir = lookup(ENV_LOG_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));

        let log_level = match lookup(ENV_LOG_LEVEL) {
            Some(level) => level.trim().parse::<LevelFilter>().map_err(|_| {
                SettingsError::InvalidConfig(format!("{ENV_LOG_LEVEL}: unknown level '{level}'"))
            })?,
            None => LevelFilter::Info,
        };

        let log_retention_days = match lookup(ENV_LOG_RETENTION_DAYS) {
            Some(days) => days.trim().parse::<u32>().map_err(|_| {
                SettingsError::InvalidConfig(format!("{ENV_LOG_RETENTION_DAYS}: '{days}' is not a number of days"))
            })?,
            None => default_log_retention_days(),
        };

        Ok(Self {
            data_dir,
            log_dir,
            log_level,
            log_retention_days,
        })
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE)
    }
}

/// File-backed preference store for this configuration
pub fn open_store(config: &AppConfig, events: Arc<dyn EventSink>) -> PreferencesStore {
    let path = config.preferences_path();
    log::info!("Opening preferences at {}", path.display());
    PreferencesStore::with_events(JsonFileBackend::new(path), events)
}
