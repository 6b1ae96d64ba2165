use std::path::{Path, PathBuf};
use std::time::Duration;

use chatlock_core::crypto::PinPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatlockConfig {
    pub store: StoreSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub pin: PinSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSection {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_poll_interval_ms() -> u64 {
    750
}

fn default_min_length() -> usize {
    PinPolicy::default().min_length
}

fn default_max_length() -> usize {
    PinPolicy::default().max_length
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for PinSection {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
        }
    }
}

impl ChatlockConfig {
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            store: StoreSection {
                path: store_path.to_string_lossy().to_string(),
            },
            sync: SyncSection::default(),
            pin: PinSection::default(),
        }
    }

    pub fn pin_policy(&self) -> PinPolicy {
        PinPolicy {
            min_length: self.pin.min_length,
            max_length: self.pin.max_length,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.poll_interval_ms.max(1))
    }

    /// Reject settings no PIN could ever satisfy.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pin.min_length == 0 || self.pin.min_length > self.pin.max_length {
            return Err(anyhow::anyhow!(
                "Invalid [pin] lengths: min_length={} max_length={}",
                self.pin.min_length,
                self.pin.max_length
            ));
        }
        Ok(())
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("vault.sqlite3"))
}

pub fn read_config(path: &Path) -> anyhow::Result<ChatlockConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: ChatlockConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
    config.validate()?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &ChatlockConfig) -> anyhow::Result<()> {
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    chatlock_core::fs::write_atomic(path, contents.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("chatlock"));
        }
    }
    Ok(home_dir()?.join(".config").join("chatlock"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("chatlock"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("chatlock"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
