//! Art-Net error types

use thiserror::Error;

use super::layout::DeviceMode;

/// Invalid device geometry or mode, detected at handler construction
/// before any session starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The device reports zero pixels.
    #[error("device has no pixels")]
    NoPixels,

    /// The layout would need more universes than the 15-bit Art-Net
    /// port-address space can carry.
    #[error("{leds} pixels need {universes} universes, exceeding the Art-Net address space")]
    TooManyUniverses { leds: usize, universes: usize },

    /// Brightness control requested on a mode without a reserved channel.
    #[error("cannot drive brightness in non-dimming mode {mode:?}")]
    NotDimmable { mode: DeviceMode },
}

/// A universe write failed. Frames are best-effort: the caller logs the
/// error and moves on, a fresher frame follows within one frame period.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to bind Art-Net socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("universe {universe} write failed: {source}")]
    Send {
        universe: u16,
        #[source]
        source: std::io::Error,
    },
}
