//! Animation scheduling: cancellable sessions, variants and predicates.

mod scheduler;
mod session;
mod variants;

pub use scheduler::{Animation, AnimationError, CancelFlag, FrameSource, StopCondition};
pub use session::{start_session, AnimationSession};
pub use variants::{CoverAnimation, IdleStop, PauseStop, PlayStop, VariantKind, VariantStop};
