//! Playback reconciliation loop
//!
//! Polls the player, decides which animation variant the snapshot calls
//! for, and swaps sessions when the variant or the track changes. Audio
//! features are fetched once per track and kept in an explicit map; a
//! failed fetch falls back to zeroed features (the generic pulse) rather
//! than blocking the swap.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use lumen_core::animation::{start_session, AnimationError, AnimationSession, VariantKind};
use lumen_core::artnet::ArtNetNode;
use lumen_core::player::{AudioFeatures, CoverSource, PlaybackState, Player, TrackId};
use lumen_core::types::{PixelGrid, Rgb};

use crate::config::AppConfig;

pub struct Reconciler<P, C> {
    node: Arc<ArtNetNode>,
    player: Arc<P>,
    covers: C,
    config: AppConfig,
    session: Option<AnimationSession>,
    features: HashMap<TrackId, AudioFeatures>,
}

impl<P: Player + 'static, C: CoverSource> Reconciler<P, C> {
    pub fn new(node: Arc<ArtNetNode>, player: Arc<P>, covers: C, config: AppConfig) -> Self {
        Self {
            node,
            player,
            covers,
            config,
            session: None,
            features: HashMap::new(),
        }
    }

    /// Runs until `shutdown` resolves. Every tick reads one playback
    /// snapshot and converges the running session on it. On shutdown the
    /// active session is stopped and awaited, so its in-flight frame has
    /// flushed by the time this returns and the caller may safely paint
    /// over the display.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let poll = self.config.animation.poll_interval();
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(poll) => self.tick().await,
            }
        }

        if let Some(session) = self.session.take() {
            let kind = session.kind();
            if let Err(e) = session.stop().await {
                log::warn!("{kind} session ended with {e} during shutdown");
            }
        }
    }

    async fn tick(&mut self) {
        let state = match self.player.current_state().await {
            Ok(state) => state,
            Err(e) => {
                // Treat an unreachable player as silence; sessions keep
                // their own predicate and will fail independently
                log::warn!("player poll failed: {e}");
                PlaybackState::idle()
            }
        };

        let wanted = VariantKind::select(&state);
        if !self.needs_swap(wanted, &state) {
            return;
        }

        if let Some(session) = self.session.take() {
            let kind = session.kind();
            match session.stop().await {
                Ok(()) => log::debug!("{kind} session stopped"),
                Err(AnimationError::Predicate(e)) => {
                    // Fatal for that session only; the swap proceeds and
                    // the next predicate gets a fresh start
                    log::error!("{kind} session lost its stop predicate: {e}");
                }
                Err(e) => log::error!("{kind} session died: {e}"),
            }
        }

        let features = match (&state.track_id, wanted) {
            (Some(track), VariantKind::Play) => self.features_for(track).await,
            _ => AudioFeatures::default(),
        };
        let grid = self.cover_for(state.track_id.as_ref()).await;

        log::info!(
            "switching to {wanted} for {}",
            state
                .track_id
                .as_ref()
                .map(TrackId::as_str)
                .unwrap_or("<no track>")
        );
        self.session = Some(start_session(
            wanted,
            Arc::clone(&self.node),
            grid,
            Arc::clone(&self.player),
            &state,
            &features,
            &self.config.animation,
        ));
    }

    fn needs_swap(&self, wanted: VariantKind, state: &PlaybackState) -> bool {
        match &self.session {
            None => true,
            Some(session) => {
                session.is_finished()
                    || session.kind() != wanted
                    || session.track() != state.track_id.as_ref()
            }
        }
    }

    /// One fetch per track; the map is never evicted, track counts over a
    /// process lifetime stay small.
    async fn features_for(&mut self, track: &TrackId) -> AudioFeatures {
        if let Some(features) = self.features.get(track) {
            return *features;
        }
        let features = match self.player.audio_features(track).await {
            Ok(features) => features,
            Err(e) => {
                log::warn!("no audio features for {track}: {e}");
                AudioFeatures::default()
            }
        };
        self.features.insert(track.clone(), features);
        features
    }

    async fn cover_for(&self, track: Option<&TrackId>) -> PixelGrid {
        let device = &self.config.device;
        match self.covers.cover(track).await {
            Ok(grid) if grid.len() == device.led_count() => grid,
            Ok(grid) => {
                log::warn!(
                    "cover is {}x{}, device wants {}x{}; using fallback",
                    grid.width(),
                    grid.height(),
                    device.width,
                    device.height
                );
                fallback_grid(device.width, device.height)
            }
            Err(e) => {
                log::warn!("cover fetch failed: {e:#}");
                fallback_grid(device.width, device.height)
            }
        }
    }
}

fn fallback_grid(width: usize, height: usize) -> PixelGrid {
    PixelGrid::solid(width, height, Rgb::new(96, 96, 96))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::FileCover;
    use crate::script::{ScriptStep, ScriptedPlayer};
    use lumen_core::artnet::{ChannelLayout, DeviceMode};
    use std::time::Duration;
    use tokio::net::UdpSocket;

    async fn reconciler_with_script(
        steps: Vec<ScriptStep>,
    ) -> (Reconciler<ScriptedPlayer, FileCover>, UdpSocket) {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut config = AppConfig::default();
        config.device.width = 4;
        config.device.height = 4;
        config.animation.poll_interval_secs = 0.1;

        let layout = ChannelLayout::compute(config.device.led_count(), DeviceMode::MultiRgb)
            .unwrap();
        let node = ArtNetNode::bind(receiver.local_addr().unwrap(), layout)
            .await
            .unwrap();
        let covers = FileCover::load(None, 4, 4);
        let reconciler = Reconciler::new(
            Arc::new(node),
            Arc::new(ScriptedPlayer::new(steps)),
            covers,
            config,
        );
        (reconciler, receiver)
    }

    fn hold(track: Option<&str>, playing: bool, secs: f32) -> ScriptStep {
        ScriptStep {
            hold_secs: secs,
            track: track.map(String::from),
            playing,
            tempo: 120.0,
            energy: 0.5,
        }
    }

    #[tokio::test]
    async fn test_first_tick_starts_a_session() {
        let (mut reconciler, receiver) =
            reconciler_with_script(vec![hold(Some("a"), true, 600.0)]).await;

        reconciler.tick().await;
        let session = reconciler.session.as_ref().unwrap();
        assert_eq!(session.kind(), VariantKind::Play);
        assert_eq!(session.track().map(TrackId::as_str), Some("a"));

        let mut buf = [0u8; 1024];
        tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .expect("the session should be painting frames")
            .unwrap();
    }

    #[tokio::test]
    async fn test_same_snapshot_keeps_the_session() {
        let (mut reconciler, _receiver) =
            reconciler_with_script(vec![hold(Some("a"), true, 600.0)]).await;

        reconciler.tick().await;
        let state = reconciler.player.current_state().await.unwrap();
        assert!(
            !reconciler.needs_swap(VariantKind::Play, &state),
            "an unchanged snapshot must not swap sessions"
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_session_before_returning() {
        let (reconciler, receiver) =
            reconciler_with_script(vec![hold(Some("a"), true, 600.0)]).await;

        let (trigger, shutdown) = tokio::sync::oneshot::channel::<()>();
        let runner = tokio::spawn(reconciler.run(async {
            let _ = shutdown.await;
        }));

        // The session is painting before we pull the plug
        let mut buf = [0u8; 1024];
        tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .expect("a frame should be transmitted")
            .unwrap();

        trigger.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .expect("shutdown must stop the session")
            .unwrap();

        // Everything the session sent is already buffered; once the
        // backlog is drained no further frames may arrive
        while receiver.try_recv(&mut buf).is_ok() {}
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(
            receiver.try_recv(&mut buf).is_err(),
            "session kept painting after shutdown"
        );
    }

    #[tokio::test]
    async fn test_silence_starts_idle() {
        let (mut reconciler, _receiver) =
            reconciler_with_script(vec![hold(None, false, 600.0)]).await;

        reconciler.tick().await;
        assert_eq!(reconciler.session.as_ref().unwrap().kind(), VariantKind::Idle);
    }
}
