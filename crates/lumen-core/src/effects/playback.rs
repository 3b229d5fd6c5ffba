//! High-level playback effects
//!
//! Maps playback situations (playing, paused, nothing on) to compiled
//! brightness curves.

use super::{compile, waveforms, EffectData};
use crate::player::AudioFeatures;

/// Breaths spliced into the pause animation.
pub const DEFAULT_BREATHE_COUNT: usize = 2;

/// Factory for the per-variant effect curves, bound to the display frame
/// rate.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackEffects {
    fps: u32,
}

impl PlaybackEffects {
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    /// Pulse phase-locked to the track tempo, one crest per beat. Track
    /// energy sharpens the crests. Falls back to [`Self::generic_play`]
    /// when the upstream reports no usable tempo; a non-finite tempo
    /// counts as unusable, it would poison the period and the pacing
    /// arithmetic downstream.
    pub fn play(&self, features: &AudioFeatures) -> EffectData {
        if !features.tempo.is_finite() || features.tempo <= 0.0 {
            return self.generic_play(0.5);
        }
        let period = waveforms::trunc_bpm_period(features.tempo);
        let sharpness = ((10.0 * features.energy) as i32).max(1);
        compile(
            waveforms::trunc_sinus_bpm(features.tempo, 0.3, 0.6, 0.0, sharpness, false),
            period,
            self.fps,
        )
    }

    /// Continuous pulse with a fixed period, for tracks without tempo data.
    pub fn generic_play(&self, period: f32) -> EffectData {
        compile(waveforms::sinus(0.3, period, 0.5, 0.0, 1), period, self.fps)
    }

    /// Slow pulse with faster "breaths" spliced in at the first crest of
    /// the primary wave, repeated `breathe_count` times.
    ///
    /// The reported period is `primary + count * secondary / 4`, a pacing
    /// approximation, not the wall-clock cycle length.
    pub fn pause(&self, breathe_count: usize) -> EffectData {
        let primary = compile(waveforms::sinus(0.5, 2.0, 0.5, 0.0, 1), 2.0, self.fps);
        let secondary = compile(
            waveforms::trunc_sinus(0.3, 0.0001, 0.7, 0.0, 1, false),
            0.0001,
            self.fps,
        );

        let crest = primary.factors().len() / 4;
        let mut factors =
            Vec::with_capacity(primary.factors().len() + breathe_count * secondary.factors().len());
        factors.extend_from_slice(&primary.factors()[..crest]);
        for _ in 0..breathe_count {
            factors.extend_from_slice(secondary.factors());
        }
        factors.extend_from_slice(&primary.factors()[crest..]);

        let period = primary.period() + breathe_count as f32 * secondary.period() / 4.0;
        EffectData::new(factors, period)
    }

    /// Slow static pulse shown when nothing is playing.
    pub fn idle(&self) -> EffectData {
        compile(waveforms::sinus(0.2, 4.0, 0.6, 0.0, 1), 4.0, self.fps)
    }
}
