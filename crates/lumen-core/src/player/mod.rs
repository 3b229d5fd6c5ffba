//! Playback collaborator boundary
//!
//! The engine never sees raw service payloads. Implementations poll their
//! upstream (a streaming API, a scripted timeline, ...) and hand over the
//! typed records defined here. Stop predicates and variant selection read
//! nothing else.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PixelGrid;

/// Opaque track identity. Only compared, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the player, as read once per poll tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Absent when nothing is on.
    pub track_id: Option<TrackId>,
    pub is_playing: bool,
    pub tempo_bpm: f32,
}

impl PlaybackState {
    /// The state reported when no track is active.
    pub fn idle() -> Self {
        Self {
            track_id: None,
            is_playing: false,
            tempo_bpm: 0.0,
        }
    }
}

/// The audio features the engine consumes. Zeroed defaults mean
/// "unknown" and make the play effect fall back to its generic pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Beats per minute.
    pub tempo: f32,
    /// 0..1, sharpens crests of tempo-locked pulses.
    pub energy: f32,
}

/// Errors surfaced by playback collaborators. A failing predicate poll is
/// fatal for its session; the orchestrator falls back to idle.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("playback source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed playback payload: {0}")]
    Malformed(String),
}

/// External music-service collaborator.
///
/// `current_state` is the only call stop predicates make; keep it cheap
/// and rate-limit friendly, it runs once per poll interval per session.
pub trait Player: Send + Sync {
    fn current_state(&self) -> impl Future<Output = Result<PlaybackState, PlayerError>> + Send;

    fn audio_features(
        &self,
        track: &TrackId,
    ) -> impl Future<Output = Result<AudioFeatures, PlayerError>> + Send;
}

/// Image collaborator: supplies a decoded grid already sized to the
/// device. The engine never fetches or decodes images itself.
pub trait CoverSource: Send + Sync {
    fn cover(
        &self,
        track: Option<&TrackId>,
    ) -> impl Future<Output = anyhow::Result<PixelGrid>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_round_trips_yaml() {
        let id = TrackId::new("4uLU6hMCjMI75M1A2tKUQC");
        let yaml = serde_yaml::to_string(&id).unwrap();
        let back: TrackId = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.as_str(), "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn test_idle_state_has_no_track() {
        let state = PlaybackState::idle();
        assert!(state.track_id.is_none());
        assert!(!state.is_playing);
    }
}
