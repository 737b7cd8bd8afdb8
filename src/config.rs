//! ae5 configuration.
//!
//! Loaded from `~/.ae5/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dispatch::WaitPolicy;
use crate::error::{Error, Result};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned columns for people.
    #[default]
    Table,
    /// Pretty-printed JSON for scripts.
    Json,
}

/// ae5 configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Platform hostname, e.g. `ae5.example.com`.
    pub hostname: Option<String>,

    /// Bearer token for API calls.
    pub token: Option<String>,

    /// Default output format.
    pub format: OutputFormat,

    /// Seconds between polls while waiting on a run.
    pub wait_interval_secs: u64,

    /// Polls before a wait gives up.
    pub wait_max_attempts: u32,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: None,
            token: None,
            format: OutputFormat::Table,
            wait_interval_secs: 5,
            wait_max_attempts: 100,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load config from `~/.ae5/config.toml`, or defaults if absent.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid config at {}: {e}", path.display())))?;

        if config.wait_max_attempts == 0 {
            return Err(Error::Config(format!(
                "wait-max-attempts must be at least 1 in {}",
                path.display()
            )));
        }

        Ok(config)
    }

    /// The config file path: `~/.ae5/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ae5").join("config.toml"))
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            interval: Duration::from_secs(self.wait_interval_secs),
            max_attempts: self.wait_max_attempts,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
