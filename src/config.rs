//! Server configuration.
//!
//! Values come from command-line flags and an optional YAML file. Flags
//! win over the file, and the file wins over built-in defaults. The resolved
//! [`Config`] is immutable and handed to the listener at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::http::parser::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_HEAD_BYTES};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4221";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "lantern")]
#[command(version)]
#[command(about = "Minimal HTTP/1.1 echo and file server", long_about = None)]
pub struct CliArgs {
    /// Directory served by the /files/ routes
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Address to listen on (e.g. 127.0.0.1:4221)
    #[arg(short, long, env = "LISTEN")]
    pub listen: Option<String>,

    /// Path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Seconds to wait for each read from a client
    #[arg(long)]
    pub read_timeout_secs: Option<u64>,

    /// Seconds to wait for a response to be written
    #[arg(long)]
    pub write_timeout_secs: Option<u64>,
}

/// YAML configuration file structure
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub listen_addr: String,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub max_head_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub directory: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FileConfig {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }
}

/// Final resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: String,
    pub directory: PathBuf,
    pub max_head_bytes: usize,
    pub max_body_bytes: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::merge(CliArgs::default(), FileConfig::default())
    }
}

impl Config {
    /// Loads configuration from the process arguments.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    pub fn from_args(cli: CliArgs) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };

        let cfg = Self::merge(cli, file);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlays CLI values on top of the file configuration.
    pub fn merge(cli: CliArgs, file: FileConfig) -> Self {
        Self {
            listen_addr: cli.listen.unwrap_or(file.server.listen_addr),
            directory: cli.directory.unwrap_or(file.storage.directory),
            max_head_bytes: file.server.max_head_bytes,
            max_body_bytes: file.server.max_body_bytes,
            read_timeout: Duration::from_secs(
                cli.read_timeout_secs.unwrap_or(file.server.read_timeout_secs),
            ),
            write_timeout: Duration::from_secs(
                cli.write_timeout_secs
                    .unwrap_or(file.server.write_timeout_secs),
            ),
            log_level: cli.log_level.unwrap_or(file.logging.level),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.max_head_bytes > 0,
            "server.max_head_bytes must be greater than zero"
        );
        anyhow::ensure!(
            !self.read_timeout.is_zero() && !self.write_timeout.is_zero(),
            "timeouts must be at least one second"
        );
        Ok(())
    }
}
