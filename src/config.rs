//! Server configuration.
//!
//! Values come from an optional JSON file and are then overridden by CLI
//! flags. Every field has a default, so an empty object `{}` is a valid file.

use crate::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SITES_ROOT: &str = "~/.cms_mcp/sites";
pub const DEFAULT_SITE: &str = "default";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Directory holding one sub-directory per site domain.
    pub sites_root: PathBuf,
    /// Site used by capabilities when the caller names none.
    pub default_site: String,
    pub session_max_age_secs: u64,
    pub cleanup_interval_secs: u64,
    /// Upper bound for a long-poll on the events endpoint.
    pub max_poll_wait_ms: u64,
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            sites_root: PathBuf::from(DEFAULT_SITES_ROOT),
            default_site: DEFAULT_SITE.to_string(),
            session_max_age_secs: 3600,
            cleanup_interval_secs: 60,
            max_poll_wait_ms: 30_000,
            bind: SocketAddr::from(([127, 0, 0, 1], 8808)),
        }
    }
}

impl ServerConfig {
    /// Loads the config file at `path`, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_site.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_site must not be empty".to_string(),
            ));
        }
        if self.session_max_age_secs == 0 {
            return Err(ConfigError::Invalid(
                "session_max_age_secs must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cleanup_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `sites_root` with a leading `~` expanded to the home directory.
    pub fn sites_root(&self) -> PathBuf {
        let raw = self.sites_root.to_string_lossy();
        PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
    }

    pub fn session_max_age(&self) -> Duration {
        Duration::from_secs(self.session_max_age_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn max_poll_wait(&self) -> Duration {
        Duration::from_millis(self.max_poll_wait_ms)
    }
}
