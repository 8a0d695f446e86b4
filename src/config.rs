//! Startup configuration for the binary: where the data file lives and how
//! logging is set up. Only `main.rs` reads this; the store and repository take
//! explicit paths.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".school-records";
/// JSON document holding both collections.
const DATA_FILE_NAME: &str = "school_data.json";
const LOG_DIR_NAME: &str = "logs";

pub const DATA_FILE_ENV: &str = "SCHOOL_RECORDS_DATA_FILE";
pub const LOG_DIR_ENV: &str = "SCHOOL_RECORDS_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "SCHOOL_RECORDS_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    /// Resolve paths under `~/.school-records/`, letting the environment
    /// override each one.
    pub fn resolve() -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        let data_dir = base_dirs.home_dir().join(DATA_DIR_NAME);
        Ok(Self::from_parts(
            data_dir,
            env::var_os(DATA_FILE_ENV).map(PathBuf::from),
            env::var_os(LOG_DIR_ENV).map(PathBuf::from),
            env::var(LOG_LEVEL_ENV).ok(),
        ))
    }

    /// Combine the default data directory with optional overrides. Blank
    /// overrides are ignored.
    pub fn from_parts(
        data_dir: PathBuf,
        data_file: Option<PathBuf>,
        log_dir: Option<PathBuf>,
        log_level: Option<String>,
    ) -> Self {
        let data_file = data_file
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| data_dir.join(DATA_FILE_NAME));
        let log_dir = log_dir
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| data_dir.join(LOG_DIR_NAME));
        let log_level = log_level
            .map(|level| level.trim().to_string())
            .filter(|level| !level.is_empty())
            .unwrap_or_else(|| default_log_level().to_string());

        Self {
            data_file,
            log_dir,
            log_level,
        }
    }
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}
