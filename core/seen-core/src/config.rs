//! Configuration loading and the fixed on-disk layout.
//!
//! Handles paths and persistence for:
//! - Tracker configuration (`config/seen/config.json`)
//! - Session store (`config/seen/seen.json`) and its legacy locations
//! - Log directory (`config/seen/logs/`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeenError};
use crate::state::Persistence;

/// Tracker settings. Every field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeenConfig {
    /// Maximum entries in a ranking unless the full list is requested.
    pub seen_top_max: usize,
    /// When merging, the human session beats its bot counterpart outright.
    pub player_prior_in_merge: bool,
    /// Emit an audit line for every join and leave.
    pub log_seens: bool,
    /// Track players connecting from the server's own address under their bot alias.
    pub identify_bot: bool,
    /// Seconds before a joining bot enters the pending-bot set.
    pub bot_list_delay: f64,
}

impl Default for SeenConfig {
    fn default() -> Self {
        SeenConfig {
            seen_top_max: 10,
            player_prior_in_merge: true,
            log_seens: true,
            identify_bot: true,
            bot_list_delay: 0.3,
        }
    }
}

impl SeenConfig {
    /// Loads the config, writing the defaults out if the file doesn't exist.
    pub fn load(path: &Path) -> Result<SeenConfig> {
        if !path.exists() {
            let config = SeenConfig::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "Wrote default configuration");
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| SeenError::Io {
            context: "reading configuration".to_string(),
            source: e,
        })?;
        let config: SeenConfig =
            serde_json::from_str(&content).map_err(|e| SeenError::ConfigMalformed {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| SeenError::Json {
            context: "serializing configuration".to_string(),
            source: e,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SeenError::Io {
                context: "creating configuration directory".to_string(),
                source: e,
            })?;
        }
        fs::write(path, content).map_err(|e| SeenError::Io {
            context: "writing configuration".to_string(),
            source: e,
        })
    }

    /// The pending-bot delay. A value no `Duration` can hold (negative, NaN
    /// or out of range) falls back to zero.
    pub fn bot_list_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.bot_list_delay).unwrap_or_else(|err| {
            tracing::warn!(
                bot_list_delay = self.bot_list_delay,
                error = %err,
                "Invalid bot_list_delay, confirming bots immediately"
            );
            Duration::ZERO
        })
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Err(err) = Duration::try_from_secs_f64(self.bot_list_delay) {
            return Err(SeenError::ConfigMalformed {
                path: path.to_path_buf(),
                details: format!(
                    "bot_list_delay must be a non-negative number of seconds, got {}: {}",
                    self.bot_list_delay, err
                ),
            });
        }
        Ok(())
    }
}

/// File layout rooted at the server working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenPaths {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub store_file: PathBuf,
    pub log_dir: PathBuf,
    /// Older store locations, checked in order when the store file is absent.
    pub legacy_store_files: Vec<PathBuf>,
}

impl SeenPaths {
    pub fn under(root: &Path) -> SeenPaths {
        let data_dir = root.join("config").join("seen");
        SeenPaths {
            config_file: data_dir.join("config.json"),
            store_file: data_dir.join("seen.json"),
            log_dir: data_dir.join("logs"),
            legacy_store_files: vec![root.join("seen.json"), root.join("config").join("seen.json")],
            data_dir,
        }
    }

    pub fn persistence(&self) -> Persistence {
        Persistence::new(self.store_file.clone(), self.legacy_store_files.clone())
    }
}
