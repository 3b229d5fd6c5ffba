//! Effects: fixed-length brightness curves compiled from waveforms
//!
//! An effect is a waveform sampled into per-frame brightness factors. The
//! sample count is pinned to the display frame rate no matter what the
//! waveform's mathematical period is: sampling at `period * i / fps`
//! normalises one full period onto one frame-rate cycle, decoupling the
//! render cadence from musical timing. Periods far from one cycle alias;
//! that is intentional and must not be "fixed" by resampling.

pub mod playback;
pub mod waveforms;

pub use playback::PlaybackEffects;

use std::time::Duration;

/// A compiled effect: one brightness factor per frame plus the nominal
/// waveform period. The period only paces playback, it never changes the
/// sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectData {
    factors: Vec<f32>,
    period: f32,
}

impl EffectData {
    pub fn new(factors: Vec<f32>, period: f32) -> Self {
        Self { factors, period }
    }

    pub fn factors(&self) -> &[f32] {
        &self.factors
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Pacing interval between frames: the nominal period divided by the
    /// frame rate. For composite effects with more factors than `fps` the
    /// wall-clock cycle is longer than the reported period; documented
    /// behaviour.
    pub fn frame_delay(&self, fps: u32) -> Duration {
        Duration::from_secs_f32(self.period / fps.max(1) as f32)
    }
}

/// Samples `waveform` into exactly `fps` brightness factors; sample `i`
/// is taken at `period * i / fps`.
pub fn compile(waveform: impl Fn(f32) -> f32, period: f32, fps: u32) -> EffectData {
    let fps = fps.max(1);
    let factors = (0..fps)
        .map(|i| waveform(period * i as f32 / fps as f32))
        .collect();
    EffectData::new(factors, period)
}
