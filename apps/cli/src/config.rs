//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/panxfer/config.toml`
//! - Windows: `%APPDATA%/panxfer/config.toml`

use std::path::{Path, PathBuf};

use panxfer_engine::config::DEFAULT_CONCURRENCY;
use panxfer_engine::{FailurePolicy, TransferConfig};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured access token.
pub const TOKEN_ENV: &str = "PANXFER_ACCESS_TOKEN";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// OAuth access token of the account.
    #[serde(default)]
    pub access_token: String,

    /// Concurrent part fetches or chunk uploads.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Target download part size in bytes.
    #[serde(default = "default_part_size")]
    pub part_size: u64,

    /// Upper bound on download parts.
    #[serde(default = "default_max_parts")]
    pub max_parts: usize,

    /// `fail_fast` or `drain_all`.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Directory for temporary part files (destination directory if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_dir: Option<PathBuf>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_part_size() -> u64 {
    TransferConfig::default().part_size
}

fn default_max_parts() -> usize {
    TransferConfig::default().max_parts
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            concurrency: default_concurrency(),
            part_size: default_part_size(),
            max_parts: default_max_parts(),
            failure_policy: FailurePolicy::default(),
            part_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from the default location, or creates a default
    /// if not found.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            Ok(config)
        }
    }

    /// Loads configuration from `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file holds the access token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Access token from `env_token` if set, else from the file.
    pub fn resolve_token(&self, env_token: Option<String>) -> Option<String> {
        env_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| Some(self.access_token.clone()).filter(|t| !t.trim().is_empty()))
    }

    /// Engine settings derived from this configuration.
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            concurrency: self.concurrency,
            part_size: self.part_size,
            max_parts: self.max_parts,
            failure_policy: self.failure_policy,
            part_dir: self.part_dir.clone(),
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("panxfer").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("panxfer")
            .join("config.toml"))
    }
}
