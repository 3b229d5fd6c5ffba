//! Display daemon configuration
//!
//! Stored as YAML in the user's config directory, default location
//! `~/.config/lumen/display.yaml`. Missing file or unknown keys fall
//! back to defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use lumen_core::config::{AnimationConfig, DeviceConfig};

pub const CONFIG_FILE: &str = "display.yaml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The Art-Net device to drive.
    pub device: DeviceConfig,
    /// Engine timing knobs.
    pub animation: AnimationConfig,
    /// Cover image shown on every variant. Absent means a built-in
    /// gradient placeholder.
    pub cover_path: Option<PathBuf>,
    /// Scripted playback timeline. Absent means the built-in demo loop.
    pub script_path: Option<PathBuf>,
}
