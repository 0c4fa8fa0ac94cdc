//! Orchestrator phase machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of a single broadcast attempt.
///
/// ```text
/// Idle -> Locking -> Handshake -> Generating -> Synthesizing -> Playing
///                        |                          ^            |  |
///                        +--------------------------+            |  +-> Complete
///                        ^                                       |
///                        +---------------------------------------+
/// any active phase -> Canceled | Failed
/// Complete | Canceled | Failed -> Idle
/// ```
///
/// `Handshake -> Synthesizing` is the feed path (dialogue already exists);
/// `Playing -> Handshake` chains the next queued broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastPhase {
    #[default]
    Idle,
    Locking,
    Handshake,
    Generating,
    Synthesizing,
    Playing,
    Complete,
    Canceled,
    Failed,
}

impl BroadcastPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Locking => "locking",
            Self::Handshake => "handshake",
            Self::Generating => "generating",
            Self::Synthesizing => "synthesizing",
            Self::Playing => "playing",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Canceled | Self::Failed)
    }

    /// Phases between admission and terminal exit.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle) && !self.is_terminal()
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        use BroadcastPhase::{
            Canceled, Complete, Failed, Generating, Handshake, Idle, Locking, Playing,
            Synthesizing,
        };
        match (self, next) {
            (Idle, Locking)
            | (Locking, Handshake)
            | (Handshake, Generating | Synthesizing)
            | (Generating, Synthesizing)
            | (Synthesizing, Playing)
            | (Playing, Complete | Handshake)
            | (Complete | Canceled | Failed, Idle) => true,
            (from, Canceled | Failed) => from.is_active(),
            _ => false,
        }
    }
}

impl fmt::Display for BroadcastPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::BroadcastPhase::*;

    #[test]
    fn test_happy_path_edges() {
        let path = [
            Idle,
            Locking,
            Handshake,
            Generating,
            Synthesizing,
            Playing,
            Complete,
            Idle,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_feed_and_chain_edges() {
        assert!(Handshake.can_transition_to(Synthesizing));
        assert!(Playing.can_transition_to(Handshake));
    }

    #[test]
    fn test_rejected_edges() {
        assert!(!Idle.can_transition_to(Playing));
        assert!(!Idle.can_transition_to(Failed));
        assert!(!Complete.can_transition_to(Failed));
        assert!(!Synthesizing.can_transition_to(Generating));
        assert!(!Canceled.can_transition_to(Locking));
    }

    #[test]
    fn test_any_active_phase_can_fail_or_cancel() {
        for phase in [Locking, Handshake, Generating, Synthesizing, Playing] {
            assert!(phase.can_transition_to(Failed));
            assert!(phase.can_transition_to(Canceled));
        }
    }
}
