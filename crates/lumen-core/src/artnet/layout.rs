//! Channel layout for WLED Art-Net devices
//!
//! Maps a pixel count and device mode onto universes and channel offsets.
//! The mapping is pure and deterministic, so it is computed once at node
//! construction and cached for the lifetime of the handler; frames only
//! ever read it.
//!
//! Mode channel widths follow the WLED DMX documentation:
//! <https://kno.wled.ge/interfaces/e1.31-dmx/>

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::types::CHANNELS_PER_UNIVERSE;

/// Art-Net universes carry a 15-bit port-address.
const MAX_UNIVERSES: usize = 1 << 15;

/// WLED Art-Net operating modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceMode {
    /// Three channels per pixel, no global brightness channel.
    MultiRgb,
    /// Three channels per pixel; universe 0 reserves its first channel for
    /// global brightness, shifting every pixel in that universe by one.
    DimMultiRgb,
}

impl DeviceMode {
    /// Channels occupied by one pixel.
    pub const fn channel_width(self) -> usize {
        match self {
            DeviceMode::MultiRgb | DeviceMode::DimMultiRgb => 3,
        }
    }

    /// Whether universe 0 reserves a dedicated brightness channel.
    pub const fn reserves_brightness(self) -> bool {
        matches!(self, DeviceMode::DimMultiRgb)
    }
}

/// Deterministic pixel-index → (universe, start channel) mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    leds: usize,
    mode: DeviceMode,
    leds_per_universe: usize,
    universes: usize,
}

impl ChannelLayout {
    pub fn compute(leds: usize, mode: DeviceMode) -> Result<Self, ConfigError> {
        if leds == 0 {
            return Err(ConfigError::NoPixels);
        }

        let leds_per_universe = CHANNELS_PER_UNIVERSE / mode.channel_width();
        let universes = leds.div_ceil(leds_per_universe);
        if universes > MAX_UNIVERSES {
            return Err(ConfigError::TooManyUniverses { leds, universes });
        }

        Ok(Self {
            leds,
            mode,
            leds_per_universe,
            universes,
        })
    }

    pub fn leds(&self) -> usize {
        self.leds
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn leds_per_universe(&self) -> usize {
        self.leds_per_universe
    }

    pub fn universes(&self) -> usize {
        self.universes
    }

    /// Channel offset of the first pixel within `universe`: 1 where the
    /// brightness channel is reserved, 0 everywhere else.
    pub fn pixel_base(&self, universe: usize) -> usize {
        if universe == 0 && self.mode.reserves_brightness() {
            1
        } else {
            0
        }
    }

    /// (universe, start channel) of pixel `index`. A pixel's channel block
    /// never crosses a universe boundary.
    pub fn pixel_slot(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.leds {
            return None;
        }
        let universe = index / self.leds_per_universe;
        let within = index % self.leds_per_universe;
        Some((
            universe,
            self.pixel_base(universe) + within * self.mode.channel_width(),
        ))
    }

    /// Pixel indices carried by `universe`. Trailing channels of the last
    /// universe stay unused.
    pub fn universe_pixels(&self, universe: usize) -> Range<usize> {
        let start = (universe * self.leds_per_universe).min(self.leds);
        let end = ((universe + 1) * self.leds_per_universe).min(self.leds);
        start..end
    }
}
