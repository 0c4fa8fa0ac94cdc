//! Dialogue domain types: anchors, tones, personalities, and script lines.
//!
//! Tone and personality are closed enumerations. Each variant maps to its
//! instruction text through an exhaustive `match`, so adding a variant without
//! instructions is a compile error rather than a silent empty prompt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closing line spoken by anchor A after the generated script.
pub const OUTRO_SIGN_OFF: &str = "This has been AI News Network.";

/// Closing line spoken by anchor B after the sign-off.
pub const OUTRO_THANKS: &str = "Thank you for watching.";

/// One of the two news anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// James Miller, always opens the broadcast.
    A,
    /// Sarah Johnson.
    B,
}

impl Speaker {
    /// Full on-air name of the anchor.
    pub const fn anchor_name(self) -> &'static str {
        match self {
            Self::A => "James Miller",
            Self::B => "Sarah Johnson",
        }
    }

    /// First name, as used in prompts and captions.
    pub const fn first_name(self) -> &'static str {
        match self {
            Self::A => "James",
            Self::B => "Sarah",
        }
    }

    /// The co-anchor.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Speaker expected at a zero-based position in an alternating script.
    pub const fn at_position(index: usize) -> Self {
        if index % 2 == 0 { Self::A } else { Self::B }
    }

    /// Parse a speaker label as returned by the language model.
    ///
    /// Accepts the slot letter, the first name, or the full name.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "a" | "anchor a" | "james" | "james miller" => Some(Self::A),
            "b" | "anchor b" | "sarah" | "sarah johnson" => Some(Self::B),
            _ => None,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor_name())
    }
}

/// A single scripted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: Speaker,
    pub text: String,
}

impl DialogueLine {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    /// The fixed two-line outro appended to every generated script.
    pub fn outro() -> [Self; 2] {
        [
            Self::new(Speaker::A, OUTRO_SIGN_OFF),
            Self::new(Speaker::B, OUTRO_THANKS),
        ]
    }
}

/// Delivery tone for the whole broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Serious,
    Satire,
    Dramatic,
    Casual,
    Optimistic,
}

impl Tone {
    pub const ALL: [Self; 5] = [
        Self::Serious,
        Self::Satire,
        Self::Dramatic,
        Self::Casual,
        Self::Optimistic,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serious => "serious",
            Self::Satire => "satire",
            Self::Dramatic => "dramatic",
            Self::Casual => "casual",
            Self::Optimistic => "optimistic",
        }
    }

    /// Instruction text injected into the system prompt.
    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Satire => {
                "Use a satirical, humorous tone. Include witty remarks, light sarcasm, and \
                 playful commentary while still covering the topic."
            }
            Self::Dramatic => {
                "Use a dramatic, intense tone. Emphasize surprising elements, use stronger \
                 language, and create a sense of urgency or importance."
            }
            Self::Casual => {
                "Use a casual, conversational tone. Present the news in a relaxed, friendly \
                 manner as if chatting with viewers."
            }
            Self::Optimistic => {
                "Use an optimistic, positive tone. Focus on hopeful aspects, potential \
                 solutions, and silver linings related to the topic."
            }
            Self::Serious => {
                "Use a serious, professional tone typical of mainstream news broadcasts. Be \
                 factual, balanced, and straightforward."
            }
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tone '{s}'"))
    }
}

/// Personality trait applied to one anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// No extra instruction.
    #[default]
    Default,
    Professional,
    Flirtatious,
    Argumentative,
    Nervous,
    Enthusiastic,
    Skeptical,
}

impl Personality {
    pub const ALL: [Self; 7] = [
        Self::Default,
        Self::Professional,
        Self::Flirtatious,
        Self::Argumentative,
        Self::Nervous,
        Self::Enthusiastic,
        Self::Skeptical,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Professional => "professional",
            Self::Flirtatious => "flirtatious",
            Self::Argumentative => "argumentative",
            Self::Nervous => "nervous",
            Self::Enthusiastic => "enthusiastic",
            Self::Skeptical => "skeptical",
        }
    }

    /// Instruction text for `speaker`, or `None` for [`Personality::Default`].
    ///
    /// Some traits reference the co-anchor by name, and the argumentative
    /// wording differs slightly between the two anchors.
    pub fn instructions(self, speaker: Speaker) -> Option<String> {
        let text = match self {
            Self::Default => return None,
            Self::Professional => {
                "Professional and composed. Maintains a formal demeanor and sticks to the facts."
                    .to_string()
            }
            Self::Flirtatious => format!(
                "Subtly flirtatious with {}. Occasionally makes charming comments or compliments \
                 while maintaining broadcast professionalism.",
                speaker.other().first_name()
            ),
            Self::Argumentative => match speaker {
                Speaker::A => "Slightly argumentative. Often plays devil's advocate and \
                               challenges statements with counterpoints."
                    .to_string(),
                Speaker::B => "Slightly argumentative. Often challenges statements and provides \
                               alternative perspectives."
                    .to_string(),
            },
            Self::Nervous => "Somewhat nervous or anxious. Occasionally uses filler words or \
                              shows subtle signs of being flustered."
                .to_string(),
            Self::Enthusiastic => "Very enthusiastic and energetic. Shows excitement about the \
                                   news topic with animated language."
                .to_string(),
            Self::Skeptical => {
                "Skeptical and questioning. Approaches topics with caution and asks probing \
                 questions."
                    .to_string()
            }
        };
        Some(text)
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Personality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown personality '{s}'"))
    }
}

/// Parameters for one dialogue generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub topic: String,
    /// Generated lines per anchor, before the outro.
    pub lines_per_anchor: u8,
    pub tone: Tone,
    pub personality_a: Personality,
    pub personality_b: Personality,
}

impl DialogueRequest {
    pub fn new(topic: impl Into<String>, lines_per_anchor: u8) -> Self {
        Self {
            topic: topic.into(),
            lines_per_anchor,
            tone: Tone::default(),
            personality_a: Personality::default(),
            personality_b: Personality::default(),
        }
    }

    #[must_use]
    pub const fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    #[must_use]
    pub const fn with_personalities(mut self, a: Personality, b: Personality) -> Self {
        self.personality_a = a;
        self.personality_b = b;
        self
    }

    /// Number of lines the model is asked for.
    pub const fn generated_line_count(&self) -> usize {
        self.lines_per_anchor as usize * 2
    }

    /// Total script length once the outro is appended.
    pub const fn total_line_count(&self) -> usize {
        self.generated_line_count() + 2
    }
}
