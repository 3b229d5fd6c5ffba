//! Cancellable animation scheduler
//!
//! One session runs two loops off a single shared flag: the frame
//! producer, which renders and transmits one frame per iteration, and a
//! spawned stop watcher, which sleeps a coarse poll interval and then
//! evaluates the variant's stop predicate. The flag is checked once per
//! frame and never mid-frame, so an in-flight frame always finishes
//! transmitting, bounding shutdown latency to one frame period plus one
//! poll interval.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::player::PlayerError;

/// Shared cooperative-cancellation flag. Cloning shares the flag; the
/// watcher and external stop requests both converge on it, the frame
/// loop only ever reads.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Errors that end an animation session.
#[derive(Error, Debug)]
pub enum AnimationError {
    /// The stop predicate failed. Fatal and never retried; the
    /// orchestrator is expected to fall back to the idle variant.
    #[error("stop predicate failed: {0}")]
    Predicate(#[from] PlayerError),

    /// A session task died without reporting back.
    #[error("animation task aborted")]
    Aborted,
}

/// Frame producer driven by the frame loop. One call renders, transmits,
/// and paces exactly one frame; it is never interrupted part-way.
pub trait FrameSource: Send + 'static {
    fn next_frame(&mut self) -> impl Future<Output = ()> + Send;
}

/// Stop predicate evaluated by the watcher once per poll interval.
pub trait StopCondition: Send + 'static {
    fn should_stop(&mut self) -> impl Future<Output = Result<bool, PlayerError>> + Send;
}

/// A frame loop and its stop watcher, bound to one cancellation flag.
pub struct Animation<F, S> {
    frames: F,
    stop: S,
    cancel: CancelFlag,
    poll_interval: Duration,
}

impl<F: FrameSource, S: StopCondition> Animation<F, S> {
    pub fn new(frames: F, stop: S, cancel: CancelFlag, poll_interval: Duration) -> Self {
        Self {
            frames,
            stop,
            cancel,
            poll_interval,
        }
    }

    /// Runs until the flag is set, either by the stop predicate or by an
    /// external stop request. A predicate failure propagates out as fatal
    /// once the final frame has flushed.
    pub async fn run(self) -> Result<(), AnimationError> {
        let Animation {
            mut frames,
            stop,
            cancel,
            poll_interval,
        } = self;

        let watcher = tokio::spawn(watch(stop, cancel.clone(), poll_interval));

        while !cancel.is_cancelled() {
            frames.next_frame().await;
        }

        match watcher.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AnimationError::Predicate(e)),
            Err(_) => Err(AnimationError::Aborted),
        }
    }
}

/// Watcher loop: sleep, re-check the flag, then poll the predicate. The
/// interval is deliberately coarser than the frame rate so a rate-limited
/// upstream status source isn't hammered.
async fn watch<S: StopCondition>(
    mut stop: S,
    cancel: CancelFlag,
    interval: Duration,
) -> Result<(), PlayerError> {
    loop {
        tokio::time::sleep(interval).await;
        if cancel.is_cancelled() {
            return Ok(());
        }
        match stop.should_stop().await {
            Ok(true) => {
                cancel.cancel();
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                // Still cancel so the frame loop winds down before the
                // error surfaces from run()
                cancel.cancel();
                return Err(e);
            }
        }
    }
}
