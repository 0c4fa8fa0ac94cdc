//! Speech synthesis and audio output ports.

use async_trait::async_trait;

use crate::domain::{AudioHandle, Voice};
use crate::error::PortError;

/// Hosted text-to-speech service.
#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    /// Render `text` with `voice` on the dispatcher-selected `model_id`.
    async fn synthesize(
        &self,
        model_id: &str,
        text: &str,
        voice: Voice,
    ) -> Result<AudioHandle, PortError>;
}

/// Local audio playback device.
#[async_trait]
pub trait AudioOutputPort: Send + Sync {
    /// Resolve once the clip is buffered and can play.
    async fn wait_playable(&self, handle: &AudioHandle) -> Result<(), PortError>;

    /// Play the clip; resolve when it ends or is stopped.
    async fn play(&self, handle: &AudioHandle) -> Result<(), PortError>;

    /// Stop and rewind every active clip. Must not block.
    fn stop_all(&self);
}
