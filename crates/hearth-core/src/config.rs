use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults::DEFAULT_SYNC_URL;
use crate::migrate::MigrationRules;

/// Directory holding the state file and project config.
pub const HEARTH_DIR: &str = ".hearth";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub migration: MigrationRules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// State file name, relative to `.hearth/`.
    #[serde(default = "default_store_file")]
    pub file: String,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: default_store_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Relay endpoint written into new households.
    #[serde(default = "default_sync_url")]
    pub default_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_url: default_sync_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// `<root>/.hearth`
#[must_use]
pub fn hearth_dir(project_root: &Path) -> PathBuf {
    project_root.join(HEARTH_DIR)
}

/// Absolute path of the state file for a project.
#[must_use]
pub fn state_path(project_root: &Path, config: &ProjectConfig) -> PathBuf {
    hearth_dir(project_root).join(&config.store.file)
}

/// # Errors
///
/// Returns an error if `.hearth/config.toml` exists but cannot be read or
/// parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = hearth_dir(project_root).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// # Errors
///
/// Returns an error if the user config exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("hearth/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Output mode precedence: `--json`, then `FORMAT`, then user config, then TTY.
#[must_use]
pub fn resolve_output(
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }
    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }
    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_store_file() -> String {
    "state.json".to_string()
}

const fn default_lock_timeout_ms() -> u64 {
    2_000
}

fn default_sync_url() -> String {
    DEFAULT_SYNC_URL.to_string()
}
