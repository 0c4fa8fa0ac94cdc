//! Event emitter trait for viewer-facing pipeline events.
//!
//! Implementations handle transport details (terminal output, channels,
//! web sockets). The pipeline only ever calls [`StudioEventEmitter::emit`].

use tokio::sync::mpsc;

use crate::events::StudioEvent;

/// Trait for emitting studio events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts without a viewer
/// - `ChannelEmitter` - Forwards into an unbounded channel
/// - Adapter-specific implementations (console renderer, ...)
pub trait StudioEventEmitter: Send + Sync {
    /// Emit an event. Must not block.
    fn emit(&self, event: StudioEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn StudioEventEmitter>;
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl StudioEventEmitter for NoopEmitter {
    fn emit(&self, _event: StudioEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn StudioEventEmitter> {
        Box::new(self.clone())
    }
}

/// Forwards events into an unbounded mpsc channel.
///
/// A closed receiver is ignored; the pipeline never fails because nobody is
/// watching.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<StudioEvent>,
}

impl ChannelEmitter {
    pub const fn new(tx: mpsc::UnboundedSender<StudioEvent>) -> Self {
        Self { tx }
    }

    /// Emitter plus the receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StudioEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl StudioEventEmitter for ChannelEmitter {
    fn emit(&self, event: StudioEvent) {
        let _ = self.tx.send(event);
    }

    fn clone_box(&self) -> Box<dyn StudioEventEmitter> {
        Box::new(self.clone())
    }
}
