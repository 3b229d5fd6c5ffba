//! Scripted playback source
//!
//! Replays a YAML timeline of playback snapshots, wrapping around when
//! the last step's hold runs out. Useful for demoing the engine and for
//! soak-testing a device without any music service attached.

use std::future::Future;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use lumen_core::player::{AudioFeatures, PlaybackState, Player, PlayerError, TrackId};

/// One step of the timeline: a playback snapshot held for `hold_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    pub hold_secs: f32,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub playing: bool,
    #[serde(default)]
    pub tempo: f32,
    #[serde(default)]
    pub energy: f32,
}

pub struct ScriptedPlayer {
    steps: Vec<ScriptStep>,
    started: Instant,
}

impl ScriptedPlayer {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        let steps = if steps.is_empty() {
            default_timeline()
        } else {
            steps
        };
        Self {
            steps,
            started: Instant::now(),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        let steps: Vec<ScriptStep> = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing script {}", path.display()))?;
        for (index, step) in steps.iter().enumerate() {
            // YAML `.nan`/`.inf` parse fine but would poison the effect
            // periods and the timeline arithmetic
            if !step.hold_secs.is_finite() || !step.tempo.is_finite() || !step.energy.is_finite()
            {
                anyhow::bail!(
                    "step {index} of {} has a non-finite hold, tempo or energy",
                    path.display()
                );
            }
        }
        Ok(Self::new(steps))
    }

    pub fn demo() -> Self {
        Self::new(default_timeline())
    }

    fn total_secs(&self) -> f32 {
        self.steps.iter().map(|s| s.hold_secs.max(0.0)).sum()
    }

    /// The step active `elapsed` seconds into the timeline, wrapping.
    fn step_at(&self, elapsed: f32) -> &ScriptStep {
        let total = self.total_secs();
        let mut cursor = if total > 0.0 { elapsed % total } else { 0.0 };
        for step in &self.steps {
            if cursor < step.hold_secs {
                return step;
            }
            cursor -= step.hold_secs.max(0.0);
        }
        // Float rounding at the wrap point lands here
        &self.steps[self.steps.len() - 1]
    }

    fn snapshot(&self) -> (PlaybackState, AudioFeatures) {
        let step = self.step_at(self.started.elapsed().as_secs_f32());
        let state = PlaybackState {
            track_id: step.track.as_deref().map(TrackId::new),
            is_playing: step.playing && step.track.is_some(),
            tempo_bpm: step.tempo,
        };
        let features = AudioFeatures {
            tempo: step.tempo,
            energy: step.energy,
        };
        (state, features)
    }
}

impl Player for ScriptedPlayer {
    fn current_state(&self) -> impl Future<Output = Result<PlaybackState, PlayerError>> + Send {
        let (state, _) = self.snapshot();
        async move { Ok(state) }
    }

    fn audio_features(
        &self,
        _track: &TrackId,
    ) -> impl Future<Output = Result<AudioFeatures, PlayerError>> + Send {
        let (_, features) = self.snapshot();
        async move { Ok(features) }
    }
}

/// Play, pause, resume at a different tempo, then go quiet.
fn default_timeline() -> Vec<ScriptStep> {
    vec![
        ScriptStep {
            hold_secs: 20.0,
            track: Some("demo-track-1".into()),
            playing: true,
            tempo: 120.0,
            energy: 0.8,
        },
        ScriptStep {
            hold_secs: 10.0,
            track: Some("demo-track-1".into()),
            playing: false,
            tempo: 120.0,
            energy: 0.8,
        },
        ScriptStep {
            hold_secs: 20.0,
            track: Some("demo-track-2".into()),
            playing: true,
            tempo: 86.0,
            energy: 0.3,
        },
        ScriptStep {
            hold_secs: 15.0,
            track: None,
            playing: false,
            tempo: 0.0,
            energy: 0.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_steps() -> ScriptedPlayer {
        ScriptedPlayer::new(vec![
            ScriptStep {
                hold_secs: 5.0,
                track: Some("a".into()),
                playing: true,
                tempo: 100.0,
                energy: 0.5,
            },
            ScriptStep {
                hold_secs: 3.0,
                track: None,
                playing: false,
                tempo: 0.0,
                energy: 0.0,
            },
        ])
    }

    #[test]
    fn test_step_lookup_and_wrap() {
        let player = two_steps();
        assert_eq!(player.step_at(0.0).track.as_deref(), Some("a"));
        assert_eq!(player.step_at(4.9).track.as_deref(), Some("a"));
        assert_eq!(player.step_at(5.1).track, None);
        // Wraps after 8 seconds
        assert_eq!(player.step_at(8.5).track.as_deref(), Some("a"));
        assert_eq!(player.step_at(13.1).track, None);
    }

    #[test]
    fn test_empty_script_falls_back_to_demo() {
        let player = ScriptedPlayer::new(Vec::new());
        assert!(!player.steps.is_empty());
        assert!(player.total_secs() > 0.0);
    }

    #[test]
    fn test_non_finite_script_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.yaml");
        std::fs::write(
            &path,
            "- hold_secs: 10.0\n  track: a\n  playing: true\n  tempo: .nan\n  energy: 0.5\n",
        )
        .unwrap();

        assert!(ScriptedPlayer::from_file(&path).is_err());

        std::fs::write(
            &path,
            "- hold_secs: .inf\n  track: a\n  playing: true\n  tempo: 120.0\n  energy: 0.5\n",
        )
        .unwrap();
        assert!(ScriptedPlayer::from_file(&path).is_err());
    }

    #[tokio::test]
    async fn test_playing_requires_a_track() {
        let player = ScriptedPlayer::new(vec![ScriptStep {
            hold_secs: 10.0,
            track: None,
            playing: true,
            tempo: 120.0,
            energy: 0.5,
        }]);
        let state = player.current_state().await.unwrap();
        assert!(!state.is_playing);
        assert!(state.track_id.is_none());
    }
}
