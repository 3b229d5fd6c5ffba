//! Animation variants: who renders and when each variant yields
//!
//! All three variants render the same way, a cover grid pulsed through a
//! compiled effect. They differ only in which stop predicate decides the
//! session is over: play yields on pause/track-change, pause yields on
//! resume/track-change, idle yields when any track appears or a timeout
//! runs out.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::artnet::ArtNetNode;
use crate::effects::EffectData;
use crate::player::{Player, PlaybackState, PlayerError, TrackId};
use crate::types::PixelGrid;

use super::scheduler::{FrameSource, StopCondition};

/// The three animation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Play,
    Pause,
    Idle,
}

impl VariantKind {
    /// Which variant a playback snapshot calls for.
    pub fn select(state: &PlaybackState) -> Self {
        match (&state.track_id, state.is_playing) {
            (Some(_), true) => VariantKind::Play,
            (Some(_), false) => VariantKind::Pause,
            (None, _) => VariantKind::Idle,
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariantKind::Play => "play",
            VariantKind::Pause => "pause",
            VariantKind::Idle => "idle",
        })
    }
}

/// Renders the cover grid, stepping cyclically through the effect's
/// brightness factors at the effect's pacing. A failed transmit drops
/// the frame and keeps going; the next frame repaints everything anyway.
pub struct CoverAnimation {
    node: Arc<ArtNetNode>,
    grid: PixelGrid,
    effect: EffectData,
    frame_delay: Duration,
    cursor: usize,
}

impl CoverAnimation {
    pub fn new(node: Arc<ArtNetNode>, grid: PixelGrid, effect: EffectData, fps: u32) -> Self {
        let frame_delay = effect.frame_delay(fps);
        Self {
            node,
            grid,
            effect,
            frame_delay,
            cursor: 0,
        }
    }
}

impl FrameSource for CoverAnimation {
    fn next_frame(&mut self) -> impl Future<Output = ()> + Send {
        let factors = self.effect.factors();
        let factor = factors.get(self.cursor).copied().unwrap_or(1.0);
        self.cursor = (self.cursor + 1) % factors.len().max(1);
        async move {
            if let Err(e) = self.node.set_pixels(&self.grid, factor).await {
                log::warn!("dropped frame: {e}");
            }
            tokio::time::sleep(self.frame_delay).await;
        }
    }
}

/// Play yields when playback pauses or the displayed track is replaced.
pub struct PlayStop<P> {
    player: Arc<P>,
    displayed: Option<TrackId>,
}

impl<P: Player> PlayStop<P> {
    pub fn new(player: Arc<P>, displayed: Option<TrackId>) -> Self {
        Self { player, displayed }
    }

    async fn should_stop(&mut self) -> Result<bool, PlayerError> {
        let state = self.player.current_state().await?;
        Ok(!state.is_playing || state.track_id != self.displayed)
    }
}

/// Pause yields when playback resumes or the displayed track is replaced.
pub struct PauseStop<P> {
    player: Arc<P>,
    displayed: Option<TrackId>,
}

impl<P: Player> PauseStop<P> {
    pub fn new(player: Arc<P>, displayed: Option<TrackId>) -> Self {
        Self { player, displayed }
    }

    async fn should_stop(&mut self) -> Result<bool, PlayerError> {
        let state = self.player.current_state().await?;
        Ok(state.is_playing || state.track_id != self.displayed)
    }
}

/// Idle yields as soon as a track shows up, or once the timeout elapses
/// so the display can go dark instead of breathing forever.
pub struct IdleStop<P> {
    player: Arc<P>,
    started: Instant,
    timeout: Duration,
}

impl<P: Player> IdleStop<P> {
    pub fn new(player: Arc<P>, timeout: Duration) -> Self {
        Self {
            player,
            started: Instant::now(),
            timeout,
        }
    }

    async fn should_stop(&mut self) -> Result<bool, PlayerError> {
        if self.started.elapsed() >= self.timeout {
            return Ok(true);
        }
        let state = self.player.current_state().await?;
        Ok(state.track_id.is_some())
    }
}

/// Per-variant stop predicate behind one type, so a session can hold any
/// of them without boxing.
pub enum VariantStop<P> {
    Play(PlayStop<P>),
    Pause(PauseStop<P>),
    Idle(IdleStop<P>),
}

impl<P: Player + 'static> StopCondition for VariantStop<P> {
    fn should_stop(&mut self) -> impl Future<Output = Result<bool, PlayerError>> + Send {
        async move {
            match self {
                VariantStop::Play(stop) => stop.should_stop().await,
                VariantStop::Pause(stop) => stop.should_stop().await,
                VariantStop::Idle(stop) => stop.should_stop().await,
            }
        }
    }
}
