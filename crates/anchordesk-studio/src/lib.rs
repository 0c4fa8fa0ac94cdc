//! Broadcast orchestration for anchordesk.
//!
//! - [`state`]: the playback guard and phase machine
//! - [`orchestrator`]: studio and feed broadcasts over a shared pipeline
//! - [`playback`]: sequential segment playback
//! - [`countdown`]: loading countdown for studio broadcasts
//! - [`queue`]: ahead-of-time preparation of follow-up topics

pub mod countdown;
pub mod orchestrator;
pub mod playback;
pub mod queue;
pub mod state;

pub use countdown::{Countdown, estimate_loading_secs};
pub use orchestrator::{
    BroadcastOutcome, BroadcastPipeline, CANCELED_STATUS, FEED_FAILURE_PHASE, FeedOrchestrator,
    QUEUED_FAILURE_PHASE, STUDIO_FAILURE_PHASE, StudioOrchestrator,
};
pub use playback::{PlaybackEngine, PlaybackReport};
pub use queue::QueueManager;
pub use state::{Admission, Attempt, PlaybackGuard, StateSnapshot, StopKind, StudioState};
