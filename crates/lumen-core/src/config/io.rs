//! Generic configuration I/O
//!
//! YAML loading and saving for any serializable configuration type. A
//! missing or unreadable file falls back to defaults so a fresh install
//! works without any setup; the binary writes those defaults back on
//! first run, giving the user a file to edit.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;

/// Load configuration from a YAML file.
///
/// Returns defaults when the file does not exist; logs a warning and
/// returns defaults when it exists but cannot be read or parsed.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("no config at {}, using defaults", path.display());
            return T::default();
        }
        Err(e) => {
            log::warn!("config {} unreadable ({e}), using defaults", path.display());
            return T::default();
        }
    };

    match serde_yaml::from_str(&raw) {
        Ok(config) => {
            log::info!("loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("config {} malformed ({e}), using defaults", path.display());
            T::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories as
/// needed.
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }

    let yaml = serde_yaml::to_string(config).context("serialising config")?;
    std::fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))?;

    log::info!("wrote config to {}", path.display());
    Ok(())
}
