//! Session lifecycle: one spawned animation per playback situation
//!
//! The orchestrator only ever holds a handle. Starting compiles the
//! variant's effect, wires the frame source and stop predicate to a fresh
//! flag and spawns the loop; stopping sets the flag and awaits the final
//! frame flush.

use std::sync::Arc;

use crate::artnet::ArtNetNode;
use crate::config::AnimationConfig;
use crate::effects::{playback::DEFAULT_BREATHE_COUNT, PlaybackEffects};
use crate::player::{AudioFeatures, PlaybackState, Player, TrackId};
use crate::types::PixelGrid;

use super::scheduler::{Animation, AnimationError, CancelFlag};
use super::variants::{CoverAnimation, IdleStop, PauseStop, PlayStop, VariantKind, VariantStop};

/// Handle to a running animation. Dropping it without `stop` leaves the
/// task running until its own predicate fires.
pub struct AnimationSession {
    kind: VariantKind,
    track: Option<TrackId>,
    cancel: CancelFlag,
    handle: tokio::task::JoinHandle<Result<(), AnimationError>>,
}

impl AnimationSession {
    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    pub fn track(&self) -> Option<&TrackId> {
        self.track.as_ref()
    }

    /// True once the task has exited, whether by predicate or stop
    /// request. The result is only known after `stop`.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Requests cancellation and waits for the in-flight frame to flush.
    pub async fn stop(self) -> Result<(), AnimationError> {
        self.cancel.cancel();
        match self.handle.await {
            Ok(result) => result,
            Err(_) => Err(AnimationError::Aborted),
        }
    }
}

/// Spawns the animation for `kind` over `grid` and hands back its handle.
pub fn start_session<P: Player + 'static>(
    kind: VariantKind,
    node: Arc<ArtNetNode>,
    grid: PixelGrid,
    player: Arc<P>,
    state: &PlaybackState,
    features: &AudioFeatures,
    config: &AnimationConfig,
) -> AnimationSession {
    let effects = PlaybackEffects::new(config.target_fps);
    let effect = match kind {
        VariantKind::Play => effects.play(features),
        VariantKind::Pause => effects.pause(DEFAULT_BREATHE_COUNT),
        VariantKind::Idle => effects.idle(),
    };
    log::info!(
        "starting {kind} animation: {} frames over {:.2}s",
        effect.factors().len(),
        effect.period()
    );

    let frames = CoverAnimation::new(node, grid, effect, config.target_fps);
    let stop = match kind {
        VariantKind::Play => VariantStop::Play(PlayStop::new(player, state.track_id.clone())),
        VariantKind::Pause => VariantStop::Pause(PauseStop::new(player, state.track_id.clone())),
        VariantKind::Idle => VariantStop::Idle(IdleStop::new(player, config.idle_timeout())),
    };

    let cancel = CancelFlag::new();
    let animation = Animation::new(frames, stop, cancel.clone(), config.poll_interval());
    let handle = tokio::spawn(animation.run());

    AnimationSession {
        kind,
        track: state.track_id.clone(),
        cancel,
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artnet::{ChannelLayout, DeviceMode};
    use crate::player::PlayerError;
    use crate::types::Rgb;
    use std::future::Future;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::net::UdpSocket;

    struct ScriptlessPlayer {
        state: Mutex<PlaybackState>,
        fail: Mutex<bool>,
    }

    impl ScriptlessPlayer {
        fn new(state: PlaybackState) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(state),
                fail: Mutex::new(false),
            })
        }
    }

    impl Player for ScriptlessPlayer {
        fn current_state(
            &self,
        ) -> impl Future<Output = Result<PlaybackState, PlayerError>> + Send {
            let failing = *self.fail.lock().unwrap();
            let state = self.state.lock().unwrap().clone();
            async move {
                if failing {
                    Err(PlayerError::Unavailable("scripted outage".into()))
                } else {
                    Ok(state)
                }
            }
        }

        fn audio_features(
            &self,
            _track: &TrackId,
        ) -> impl Future<Output = Result<AudioFeatures, PlayerError>> + Send {
            async move { Ok(AudioFeatures::default()) }
        }
    }

    async fn local_node() -> (Arc<ArtNetNode>, UdpSocket) {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target: SocketAddr = receiver.local_addr().unwrap();
        let layout = ChannelLayout::compute(16, DeviceMode::MultiRgb).unwrap();
        let node = ArtNetNode::bind(target, layout).await.unwrap();
        (Arc::new(node), receiver)
    }

    fn quick_config() -> AnimationConfig {
        AnimationConfig {
            target_fps: 30,
            poll_interval_secs: 0.1,
            idle_timeout_secs: 60,
        }
    }

    fn playing(track: &str) -> PlaybackState {
        PlaybackState {
            track_id: Some(TrackId::new(track)),
            is_playing: true,
            tempo_bpm: 120.0,
        }
    }

    #[tokio::test]
    async fn test_session_stops_on_request() {
        let (node, receiver) = local_node().await;
        let player = ScriptlessPlayer::new(playing("a"));
        let state = playing("a");
        let grid = PixelGrid::solid(4, 4, Rgb::new(200, 40, 40));

        let session = start_session(
            VariantKind::Play,
            node,
            grid,
            player,
            &state,
            &AudioFeatures::default(),
            &quick_config(),
        );
        assert_eq!(session.kind(), VariantKind::Play);
        assert_eq!(session.track().map(TrackId::as_str), Some("a"));

        // At least one frame lands before we pull the plug
        let mut buf = [0u8; 1024];
        tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .expect("a frame should be transmitted")
            .unwrap();

        session.stop().await.expect("clean stop");
    }

    #[tokio::test]
    async fn test_session_finishes_when_playback_pauses() {
        let (node, _receiver) = local_node().await;
        let player = ScriptlessPlayer::new(playing("a"));
        let state = playing("a");
        let grid = PixelGrid::solid(4, 4, Rgb::new(10, 200, 10));

        let session = start_session(
            VariantKind::Play,
            node,
            grid,
            Arc::clone(&player),
            &state,
            &AudioFeatures::default(),
            &quick_config(),
        );

        player.state.lock().unwrap().is_playing = false;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !session.is_finished() {
            assert!(tokio::time::Instant::now() < deadline, "predicate never fired");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        session.stop().await.expect("predicate stop is clean");
    }

    #[tokio::test]
    async fn test_predicate_failure_surfaces_from_stop() {
        let (node, _receiver) = local_node().await;
        let player = ScriptlessPlayer::new(playing("a"));
        let state = playing("a");
        let grid = PixelGrid::solid(4, 4, Rgb::new(10, 10, 200));

        let session = start_session(
            VariantKind::Play,
            node,
            grid,
            Arc::clone(&player),
            &state,
            &AudioFeatures::default(),
            &quick_config(),
        );

        *player.fail.lock().unwrap() = true;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !session.is_finished() {
            assert!(tokio::time::Instant::now() < deadline, "failure never surfaced");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let result = session.stop().await;
        assert!(matches!(result, Err(AnimationError::Predicate(_))));
    }
}
