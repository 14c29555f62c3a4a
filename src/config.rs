//! Configuration loading and management
//!
//! Handles parsing of `taskdesk.toml` in the data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::views::SortOrder;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "taskdesk.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Demo data seeding
    #[serde(default)]
    pub seed: SeedConfig,

    /// Deadline classification
    #[serde(default)]
    pub deadlines: DeadlineConfig,

    /// On-disk store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task list defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Write demo users and tasks into an empty store
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineConfig {
    /// A deadline is "approaching" within this many days
    #[serde(default = "default_approaching_days")]
    pub approaching_days: u32,
}

fn default_approaching_days() -> u32 {
    2
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            approaching_days: default_approaching_days(),
        }
    }
}

impl DeadlineConfig {
    pub fn approaching_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.approaching_days))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How long a write waits for another process's lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Sort used by `task list` when `--sort` is not given
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

fn default_sort() -> String {
    "newest".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_sort: default_sort(),
        }
    }
}

impl TasksConfig {
    pub fn sort_order(&self) -> Result<SortOrder> {
        self.default_sort.parse()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `taskdesk.toml` from the data directory, or defaults if absent.
    ///
    /// A present but invalid file is an error rather than a silent fallback.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.deadlines.approaching_days == 0 || self.deadlines.approaching_days > 365 {
            return Err(Error::InvalidConfig(
                "deadlines.approaching_days must be between 1 and 365".to_string(),
            ));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        self.tasks.sort_order().map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_sort: invalid sort '{}' (expected newest|oldest|deadline|priority|status)",
                self.tasks.default_sort
            ))
        })?;
        Ok(())
    }
}

/// Resolve the data directory: explicit path (flag or `TASKDESK_DIR`), else
/// the platform data directory.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    directories::ProjectDirs::from("", "", "taskdesk")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(Error::NoDataDir)
}
