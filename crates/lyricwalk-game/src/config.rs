use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::collect::DEFAULT_COLLECT_RADIUS_M;
use crate::refresh::RefreshSchedule;
use lyricwalk_core::geofence::DEFAULT_MAX_ATTEMPTS_PER_MARKER;

/// Configuration for lyricwalk.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (LWALK_* prefix)
/// 3. Config file (~/.config/lyricwalk/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite catalog.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: LWALK_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/lyricwalk/lyricwalk.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Maximum distance in metres at which a marker can be collected.
    #[serde(default = "default_collect_radius")]
    pub collect_radius_m: f64,

    /// Local hour of the daily marker refresh.
    #[serde(default)]
    pub refresh_hour: u32,

    /// Local minute of the daily marker refresh.
    #[serde(default)]
    pub refresh_minute: u32,

    /// Retries for a refresh that failed on a transient error.
    #[serde(default = "default_refresh_retries")]
    pub refresh_retries: usize,

    /// Sampling attempts allowed per generated marker.
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_marker: usize,

    /// Log level: trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_coloured")]
    pub log_coloured: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            collect_radius_m: default_collect_radius(),
            refresh_hour: 0,
            refresh_minute: 0,
            refresh_retries: default_refresh_retries(),
            max_attempts_per_marker: default_max_attempts(),
            log_level: default_log_level(),
            log_coloured: default_log_coloured(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/lyricwalk/config.toml
    /// Reads environment variables with LWALK_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("lwalk");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// The daily refresh time as a validated schedule.
    pub fn refresh_schedule(&self) -> Result<RefreshSchedule> {
        RefreshSchedule::new(self.refresh_hour, self.refresh_minute)
            .context("Invalid refresh_hour/refresh_minute")
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/lyricwalk/lyricwalk.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lyricwalk")
        .join("lyricwalk.db")
}

const fn default_collect_radius() -> f64 {
    DEFAULT_COLLECT_RADIUS_M
}

const fn default_refresh_retries() -> usize {
    3
}

const fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS_PER_MARKER
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_log_coloured() -> bool {
    true
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/lyricwalk/config.toml
/// - macOS: ~/Library/Application Support/lyricwalk/config.toml
/// - Windows: %APPDATA%\lyricwalk\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lyricwalk")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# LyricWalk Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (LWALK_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite catalog
#
# Holds the song tables and the campus markers
#
# Can also be set via:
# - CLI: lyricwalk --db /custom/path.db status
# - Environment: LWALK_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/lyricwalk.db"

# Distance in metres within which a marker can be collected
collect_radius_m = 50.0

# Local time of the daily marker refresh (24-hour clock)
refresh_hour = 0
refresh_minute = 0

# Retries for a refresh that hit a busy database
refresh_retries = 3

# Sampling attempts allowed per generated marker before a category is
# skipped for the day
max_attempts_per_marker = 1000

# Logging
log_level = "info"
log_coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
