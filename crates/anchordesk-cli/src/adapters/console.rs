//! Terminal audio output and event rendering.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, warn};

use anchordesk_core::ports::{AudioOutputPort, StudioEventEmitter};
use anchordesk_core::{AudioHandle, OverlayKind, PortError, StudioEvent};

/// 128 kbit/s, the speech service's mp3 rate.
const BYTES_PER_SEC: u64 = 16_000;
const MIN_CLIP: Duration = Duration::from_millis(500);
const MAX_CLIP: Duration = Duration::from_secs(60);

/// Plays clips through an external player, or paces them silently.
///
/// `player` is a command line such as `ffplay -nodisp -autoexit`; the clip
/// path is appended. Without one, each clip "plays" for the time its size
/// implies so the broadcast keeps its rhythm.
pub struct TerminalAudio {
    player: Option<Vec<String>>,
    stop: Notify,
}

impl TerminalAudio {
    pub fn new(player: Option<&str>) -> Self {
        let player = player
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());
        Self {
            player,
            stop: Notify::new(),
        }
    }

    async fn run_player(&self, parts: &[String], path: &Path) -> Result<(), PortError> {
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| PortError::Other("empty player command".into()))?;
        let mut child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PortError::Unavailable(format!("{program}: {e}")))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| PortError::Other(e.to_string()))?;
                if !status.success() {
                    warn!(target: "anchordesk.cli", %status, path = %path.display(), "Player exited with failure");
                }
            }
            () = self.stop.notified() => {
                debug!(target: "anchordesk.cli", "Player stopped");
            }
        }
        Ok(())
    }

    async fn pace(&self, path: &Path) -> Result<(), PortError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| PortError::NotFound(format!("{}: {e}", path.display())))?
            .len();
        let length = clip_length(size);
        tokio::select! {
            () = tokio::time::sleep(length) => {}
            () = self.stop.notified() => {}
        }
        Ok(())
    }
}

/// Approximate duration of an mp3 clip of `size` bytes.
fn clip_length(size: u64) -> Duration {
    Duration::from_millis(size.saturating_mul(1000) / BYTES_PER_SEC).clamp(MIN_CLIP, MAX_CLIP)
}

#[async_trait]
impl AudioOutputPort for TerminalAudio {
    async fn wait_playable(&self, handle: &AudioHandle) -> Result<(), PortError> {
        let meta = tokio::fs::metadata(&handle.uri)
            .await
            .map_err(|e| PortError::NotFound(format!("{}: {e}", handle.uri)))?;
        if meta.len() == 0 {
            return Err(PortError::InvalidPayload(format!("{} is empty", handle.uri)));
        }
        Ok(())
    }

    async fn play(&self, handle: &AudioHandle) -> Result<(), PortError> {
        let path = Path::new(&handle.uri);
        match &self.player {
            Some(parts) => self.run_player(parts, path).await,
            None => self.pace(path).await,
        }
    }

    fn stop_all(&self) {
        self.stop.notify_waiters();
    }
}

/// Prints captions and status lines; everything else goes to the log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleEmitter;

impl ConsoleEmitter {
    pub const fn new() -> Self {
        Self
    }
}

/// Terminal line for an event, if it deserves one.
fn render(event: &StudioEvent) -> Option<String> {
    match event {
        StudioEvent::Status { message } => Some(format!("» {message}")),
        StudioEvent::BreakingNews { topic } => Some(format!("\n*** BREAKING NEWS: {topic} ***\n")),
        StudioEvent::Caption { speaker, text } => {
            Some(format!("{:>14}: {text}", speaker.anchor_name()))
        }
        StudioEvent::SynthesisProgress {
            loaded,
            total,
            percent,
        } => Some(format!("  voicing {loaded}/{total} ({percent}%)")),
        StudioEvent::Countdown { remaining_secs } if *remaining_secs % 5 == 0 => {
            Some(format!("  ready in ~{remaining_secs}s"))
        }
        StudioEvent::Overlay {
            kind: OverlayKind::Outro,
            visible: true,
        } => Some("\n--- AI News Network ---".to_string()),
        StudioEvent::OfflineMode { .. } => Some("  (coordinator offline)".to_string()),
        StudioEvent::BroadcastSaved { broadcast_id } => Some(format!("  saved as {broadcast_id}")),
        StudioEvent::CanceledIndicator { visible: true } => Some("  loading canceled".to_string()),
        _ => None,
    }
}

impl StudioEventEmitter for ConsoleEmitter {
    fn emit(&self, event: StudioEvent) {
        match render(&event) {
            Some(line) => println!("{line}"),
            None => debug!(target: "anchordesk.cli", event = event.event_name(), ?event, "Studio event"),
        }
    }

    fn clone_box(&self) -> Box<dyn StudioEventEmitter> {
        Box::new(self.clone())
    }
}
