// Logging
// File logger for the `log` facade

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

use crate::config::AppConfig;
use crate::error::{SettingsError, SettingsResult};
use crate::services::prune_logs;

pub const LOG_FILE_NAME: &str = "recorder-settings.log";

pub struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl FileLogger {
    pub fn new(log_dir: &Path, level: LevelFilter) -> SettingsResult<Self> {
        std::fs::create_dir_all(log_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LOG_FILE_NAME))?;
        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

pub fn format_line(record: &Record) -> String {
    let timestamp = Local::now();
    let date = timestamp.format("%Y-%m-%d");
    let time = timestamp.format("%H:%M:%S");
    let target = record.target();
    let level = record.level();
    format!("[{date}][{time}][{target}][{level}] {}", record.args())
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record);
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Install the file logger as the global logger and prune expired logs.
/// Fails if a logger is already installed.
pub fn init_logging(config: &AppConfig) -> SettingsResult<()> {
    let logger = FileLogger::new(&config.log_dir, config.log_level)?;
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| SettingsError::InvalidConfig(format!("Failed to install logger: {e}")))?;
    log::set_max_level(config.log_level);

    log::info!("Recorder settings logging to {}", config.log_dir.display());
    if let Err(e) = prune_logs(&config.log_dir, config.log_retention_days) {
        log::warn!("Failed to prune logs: {}", e);
    }
    Ok(())
}
