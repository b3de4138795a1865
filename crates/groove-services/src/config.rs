//! Engine configuration file

use std::fs;
use std::path::{Path, PathBuf};

use groove_core::style::DEFAULT_REMOTE_PORT;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::processor::{DEFAULT_DRAIN_CAP, DEFAULT_MAX_BLOCK_EVENTS};
use crate::queue::CONTROL_QUEUE_CAPACITY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config encode error: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Samples per block
    pub block_size: u32,
    pub tempo_bpm: f64,
    /// Output slots reserved per block
    pub max_block_events: usize,
    pub queue_capacity: usize,
    /// Control messages applied per block
    pub drain_cap: usize,
    /// Where engine state is loaded from at start and saved to at exit
    pub state_path: Option<PathBuf>,
    pub remote: RemoteConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
            tempo_bpm: 120.0,
            max_block_events: DEFAULT_MAX_BLOCK_EVENTS,
            queue_capacity: CONTROL_QUEUE_CAPACITY,
            drain_cap: DEFAULT_DRAIN_CAP,
            state_path: None,
            remote: RemoteConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Initial value of the remote-control flag
    pub enabled: bool,
    /// Initial listening port; clamped to 1000-65535
    pub port: u16,
    pub bind_address: String,
    /// Socket read timeout, bounds how fast the listener notices changes
    pub poll_interval_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_REMOTE_PORT,
            bind_address: "127.0.0.1".to_string(),
            poll_interval_ms: 50,
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("groove")
        .join("config.toml")
}

/// Parse a config from TOML text
pub fn parse_config(text: &str) -> Result<EngineConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Load a config file. A missing file yields defaults; a broken one is an error.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let config = parse_config(&text)?;
            info!(path = %path.display(), "Loaded engine config");
            Ok(config)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "No config file, using defaults");
            Ok(EngineConfig::default())
        }
        Err(err) => Err(err.into()),
    }
}

pub fn save_config(path: &Path, config: &EngineConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}
