//! Configuration for the Lumen engine
//!
//! Provides the device and animation config sections plus generic YAML
//! loading/saving shared by the display binary and any future tooling.
//!
//! # Usage
//!
//! ```ignore
//! use lumen_core::config::{load_config, default_config_path};
//!
//! let config: MyAppConfig = load_config(&default_config_path("config.yaml"));
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::default_config_path;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artnet::DeviceMode;

/// Standard Art-Net UDP port. Changing it is possible but discouraged.
pub const ARTNET_PORT: u16 = 6454;

/// Geometry and addressing of the target WLED device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// mDNS name or IP address of the device.
    pub address: String,
    pub port: u16,
    /// Matrix dimensions in pixels.
    pub width: usize,
    pub height: usize,
    /// WLED Art-Net mode, decides channel widths and brightness handling.
    pub mode: DeviceMode,
    /// Value written to the reserved brightness channel in dimming modes.
    pub brightness: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: "wled.local".to_string(),
            port: ARTNET_PORT,
            width: 16,
            height: 16,
            mode: DeviceMode::MultiRgb,
            brightness: u8::MAX,
        }
    }
}

impl DeviceConfig {
    pub fn led_count(&self) -> usize {
        self.width * self.height
    }
}

/// Timing knobs for the animation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Frames per second to render. High values cause time drift because a
    /// frame's transmission eats into its own slice; keep this modest.
    pub target_fps: u32,
    /// Seconds between stop-predicate polls. Deliberately coarser than the
    /// frame rate so a rate-limited upstream isn't hammered.
    pub poll_interval_secs: f32,
    /// Seconds without an active track before the idle animation gives up.
    pub idle_timeout_secs: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            target_fps: 24,
            poll_interval_secs: 2.0,
            idle_timeout_secs: 5 * 60,
        }
    }
}

impl AnimationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f32(self.poll_interval_secs.max(0.1))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
