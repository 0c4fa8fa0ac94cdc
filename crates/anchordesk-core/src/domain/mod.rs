//! Domain types shared by every anchordesk crate.

pub mod audio;
pub mod broadcast;
pub mod dialogue;
pub mod phase;
pub mod queue;
pub mod task;

pub use audio::{AudioBundle, AudioHandle, AudioSegment, Voice};
pub use broadcast::{Broadcast, FeedFilter, NewBroadcast, Visibility};
pub use dialogue::{
    DialogueLine, DialogueRequest, OUTRO_SIGN_OFF, OUTRO_THANKS, Personality, Speaker, Tone,
};
pub use phase::BroadcastPhase;
pub use queue::{QueueItem, QueueItemStatus, QueueStatus};
pub use task::{Task, TaskId, TaskKind, TaskStatus};
