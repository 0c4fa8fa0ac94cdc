//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces the pipeline expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No HTTP client or filesystem types in any signature
//! - Async traits use `async_trait` so they stay object safe behind `Arc<dyn _>`
//! - Adapters map their own failures into [`PortError`](crate::error::PortError)

pub mod coordinator;
pub mod event_emitter;
pub mod language_model;
pub mod record_store;
pub mod speech;

pub use coordinator::CoordinatorTransport;
pub use event_emitter::{ChannelEmitter, NoopEmitter, StudioEventEmitter};
pub use language_model::{ChatMessage, ChatRequest, ChatRole, LanguageModelPort};
pub use record_store::{BROADCAST_COLLECTION, RecordStorePort};
pub use speech::{AudioOutputPort, SpeechSynthesisPort};
