//! Path utilities for Lumen configuration files

use std::path::PathBuf;

/// Default config file path for a given file name.
///
/// Returns: `~/.config/lumen/{filename}` (or the platform equivalent).
pub fn default_config_path(filename: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lumen")
        .join(filename)
}
