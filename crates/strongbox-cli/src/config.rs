use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::{AlgorithmChoice, BackendChoice};

#[derive(Debug, Serialize, Deserialize)]
pub struct StrongboxConfig {
    pub store: StoreSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSection {
    pub dir: String,
}

/// Choices used by `init` when no flag overrides them.
#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultsSection {
    pub algorithm: AlgorithmChoice,
    pub backend: BackendChoice,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmChoice::Aes256Gcm,
            backend: BackendChoice::Sqlite,
        }
    }
}

impl StrongboxConfig {
    pub fn new(store_dir: &Path) -> Self {
        Self {
            store: StoreSection {
                dir: store_dir.to_string_lossy().to_string(),
            },
            defaults: DefaultsSection::default(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_dir() -> anyhow::Result<PathBuf> {
    xdg_data_dir()
}

pub fn read_config(path: &Path) -> anyhow::Result<StrongboxConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &StrongboxConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("strongbox"));
        }
    }
    Ok(home_dir()?.join(".config").join("strongbox"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("strongbox"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("strongbox"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
