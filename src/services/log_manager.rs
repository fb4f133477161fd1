// LogManager Service
// Log retention cleanup for the settings log directory

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::SettingsResult;

fn log_files(log_dir: &Path) -> SettingsResult<Vec<(PathBuf, SystemTime)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(log_dir)?.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("log") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((path, modified));
    }
    Ok(files)
}

/// Delete `.log` files older than `retention_days`. Zero days keeps everything.
pub fn prune_logs(log_dir: &Path, retention_days: u32) -> SettingsResult<usize> {
    if retention_days == 0 || !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(retention_days as u64 * 24 * 60 * 60))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let removed = log_files(log_dir)?
        .into_iter()
        .filter(|(path, modified)| *modified < cutoff && fs::remove_file(path).is_ok())
        .count();

    if removed > 0 {
        log::info!("Pruned {} log file(s) from {}", removed, log_dir.display());
    }
    Ok(removed)
}
