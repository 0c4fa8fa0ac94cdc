//! Core domain types, ports, and content policy for anchordesk.
//!
//! This crate has no I/O of its own. The dispatcher, handshake client, and
//! studio crates depend on it for shared types; adapters implement its ports.

pub mod contracts;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod sanitize;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AudioBundle, AudioHandle, AudioSegment, Broadcast, BroadcastPhase, DialogueLine,
    DialogueRequest, FeedFilter, NewBroadcast, OUTRO_SIGN_OFF, OUTRO_THANKS, Personality, QueueItem,
    QueueItemStatus, QueueStatus, Speaker, Task, TaskId, TaskKind, TaskStatus, Tone, Visibility, Voice,
};
pub use error::{
    BUSY_LOADING_MESSAGE, BUSY_LOCKED_MESSAGE, HandshakeError, PortError, StudioError,
    StudioResult,
};
pub use events::{OverlayKind, StudioEvent};
pub use ports::{
    AudioOutputPort, ChannelEmitter, ChatMessage, ChatRequest, CoordinatorTransport,
    LanguageModelPort, NoopEmitter, RecordStorePort, SpeechSynthesisPort, StudioEventEmitter,
};
pub use services::{BroadcastLibrary, FeedSubscription, InMemoryRecordStore};
pub use settings::{ModelPoolConfig, ModelSpec, SettingsError, StudioSettings, validate_settings};
