//! Rendered audio types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dialogue::{DialogueLine, Speaker};

/// Voice preset understood by the speech service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    #[serde(rename = "en-male")]
    EnMale,
    #[serde(rename = "en-female")]
    EnFemale,
}

impl Voice {
    /// Fixed voice assignment per anchor.
    pub const fn for_speaker(speaker: Speaker) -> Self {
        match speaker {
            Speaker::A => Self::EnMale,
            Speaker::B => Self::EnFemale,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnMale => "en-male",
            Self::EnFemale => "en-female",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a rendered clip.
///
/// The `uri` is whatever the speech adapter hands back (a file path, a blob
/// URL, an object key). `playable` is cleared when the clip failed to load so
/// playback can skip it instead of failing the broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioHandle {
    pub uri: String,
    pub playable: bool,
}

impl AudioHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            playable: true,
        }
    }

    /// Mark the handle as failed to load.
    #[must_use]
    pub fn unusable(mut self) -> Self {
        self.playable = false;
        self
    }
}

/// A dialogue line paired with its rendered audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSegment {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<AudioHandle>,
}

impl AudioSegment {
    pub fn rendered(line: &DialogueLine, handle: AudioHandle) -> Self {
        Self {
            speaker: line.speaker,
            text: line.text.clone(),
            handle: Some(handle),
        }
    }

    /// Segment whose synthesis failed; playback skips it.
    pub fn missing(line: &DialogueLine) -> Self {
        Self {
            speaker: line.speaker,
            text: line.text.clone(),
            handle: None,
        }
    }

    /// Playable handle, if the clip rendered and loaded.
    pub fn playable_handle(&self) -> Option<&AudioHandle> {
        self.handle.as_ref().filter(|h| h.playable && !h.uri.is_empty())
    }
}

/// Ordered segments, index-aligned with the originating dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioBundle {
    segments: Vec<AudioSegment>,
}

impl AudioBundle {
    /// Build a bundle from `(index, segment)` pairs in any completion order.
    pub fn from_indexed(mut indexed: Vec<(usize, AudioSegment)>) -> Self {
        indexed.sort_by_key(|(index, _)| *index);
        Self {
            segments: indexed.into_iter().map(|(_, segment)| segment).collect(),
        }
    }

    pub fn segments(&self) -> &[AudioSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn playable_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.playable_handle().is_some())
            .count()
    }
}

impl From<Vec<AudioSegment>> for AudioBundle {
    fn from(segments: Vec<AudioSegment>) -> Self {
        Self { segments }
    }
}
