//! Dialogue generation task.
//!
//! Builds the prompt from the closed tone/personality enums, issues one JSON
//! mode completion through the dispatcher, and normalizes the reply into a
//! strictly alternating script followed by the fixed outro.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use anchordesk_core::ports::{ChatMessage, ChatRequest, LanguageModelPort};
use anchordesk_core::{
    DialogueLine, DialogueRequest, Speaker, StudioError, StudioResult, TaskKind,
};

use crate::dispatcher::TaskDispatcher;

const PERSONALITY_GUIDANCE: &str = "IMPORTANT: These personality traits should be subtle and \
    appropriate for a news broadcast. The personalities should complement, not override, the \
    overall tone of the broadcast. Keep the news content as the primary focus while letting \
    these personality traits influence the delivery style and interactions between anchors.";

/// Per-anchor personality block, or empty when both anchors use the default.
pub fn personality_instructions(request: &DialogueRequest) -> String {
    let a = request.personality_a.instructions(Speaker::A);
    let b = request.personality_b.instructions(Speaker::B);
    if a.is_none() && b.is_none() {
        return String::new();
    }

    let mut block = String::from("Anchor personalities:");
    for (speaker, text) in [(Speaker::A, a), (Speaker::B, b)] {
        block.push('\n');
        block.push_str(speaker.anchor_name());
        block.push_str(": ");
        block.push_str(text.as_deref().unwrap_or("No particular personality."));
    }
    block.push_str("\n\n");
    block.push_str(PERSONALITY_GUIDANCE);
    block
}

pub fn system_prompt(request: &DialogueRequest) -> String {
    let a = Speaker::A;
    let b = Speaker::B;
    format!(
        "You are a news script writer. Create a back-and-forth dialogue between two news \
         anchors named {a_name} and {b_name} discussing the following topic: \"{topic}\".\n\
         Write a script with exactly {total} exchanges ({per} for each anchor), alternating \
         between {a_first} and {b_first}.\n\
         Each anchor's line should be 1-2 sentences long, concise, and informative.\n\
         Start with {a_first} introducing the topic, and end with {b_first} wrapping up.\n\n\
         {tone}\n\n\
         {personalities}\n\n\
         Format the response as a JSON array with objects containing 'speaker' (either \
         '{a_first}' or '{b_first}') and 'text' fields.\n\
         Make it sound like a professional news broadcast with clear transitions between \
         speakers.",
        a_name = a.anchor_name(),
        b_name = b.anchor_name(),
        a_first = a.first_name(),
        b_first = b.first_name(),
        topic = request.topic,
        total = request.generated_line_count(),
        per = request.lines_per_anchor,
        tone = request.tone.instructions(),
        personalities = personality_instructions(request),
    )
}

pub fn user_prompt(request: &DialogueRequest) -> String {
    format!(
        "Create a {tone} news dialogue about: {topic} with {per} lines per anchor. {a} has a \
         {pa} personality and {b} has a {pb} personality.",
        tone = request.tone,
        topic = request.topic,
        per = request.lines_per_anchor,
        a = Speaker::A.first_name(),
        pa = request.personality_a,
        b = Speaker::B.first_name(),
        pb = request.personality_b,
    )
}

pub fn chat_request(request: &DialogueRequest) -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system(system_prompt(request)),
        ChatMessage::user(user_prompt(request)),
    ])
    .json()
}

#[derive(Deserialize)]
struct RawLine {
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Strip a Markdown code fence if the model wrapped its JSON in one.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Find the line array: either the whole document or the first array field
/// of a wrapping object.
fn line_array(value: serde_json::Value) -> Option<Vec<serde_json::Value>> {
    match value {
        serde_json::Value::Array(items) => Some(items),
        serde_json::Value::Object(map) => {
            for key in ["dialogue", "lines", "script"] {
                if let Some(serde_json::Value::Array(items)) = map.get(key) {
                    return Some(items.clone());
                }
            }
            map.into_iter().find_map(|(_, v)| match v {
                serde_json::Value::Array(items) => Some(items),
                _ => None,
            })
        }
        _ => None,
    }
}

/// Parse the model reply into a script of exactly `expected` alternating
/// lines plus the outro.
///
/// Extra lines are dropped. Speakers are assigned by position; a mislabeled
/// line keeps its text.
pub fn parse_script(raw: &str, expected: usize) -> StudioResult<Vec<DialogueLine>> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| StudioError::generation(format!("unparsable model output: {e}")))?;
    let items = line_array(value)
        .ok_or_else(|| StudioError::generation("model output is not a list of lines"))?;

    let lines: Vec<RawLine> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawLine>(item).ok())
        .filter(|line| line.text.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .collect();

    if lines.len() < expected {
        return Err(StudioError::generation(format!(
            "expected {expected} lines, model returned {}",
            lines.len()
        )));
    }

    let mut script: Vec<DialogueLine> = lines
        .into_iter()
        .take(expected)
        .enumerate()
        .map(|(index, raw)| {
            let speaker = Speaker::at_position(index);
            let labeled = raw.speaker.as_deref().and_then(Speaker::from_label);
            if labeled.is_some_and(|s| s != speaker) {
                debug!(target: "anchordesk.dialogue", index, "Reassigned speaker to keep alternation");
            }
            DialogueLine::new(speaker, raw.text.unwrap_or_default().trim())
        })
        .collect();
    script.extend(DialogueLine::outro());
    Ok(script)
}

/// Generates scripts through the dispatcher.
pub struct DialogueGenerator {
    dispatcher: Arc<TaskDispatcher>,
    model: Arc<dyn LanguageModelPort>,
}

impl DialogueGenerator {
    pub fn new(dispatcher: Arc<TaskDispatcher>, model: Arc<dyn LanguageModelPort>) -> Self {
        Self { dispatcher, model }
    }

    /// Returns exactly `2 * lines_per_anchor + 2` lines, starting with anchor A.
    pub async fn generate(&self, request: &DialogueRequest) -> StudioResult<Vec<DialogueLine>> {
        if request.lines_per_anchor == 0 {
            return Err(StudioError::validation("lines per anchor must be at least 1"));
        }
        if request.topic.trim().is_empty() {
            return Err(StudioError::validation("Please enter a topic"));
        }

        let chat = chat_request(request);
        let expected = request.generated_line_count();
        let model = Arc::clone(&self.model);
        let params = json!({
            "topic": request.topic,
            "lines_per_anchor": request.lines_per_anchor,
            "tone": request.tone,
        });

        let script = self
            .dispatcher
            .submit(TaskKind::Dialogue, params, move |model_id| async move {
                let raw = model
                    .complete(&model_id, &chat)
                    .await
                    .map_err(|e| StudioError::generation(e.to_string()))?;
                parse_script(&raw, expected)
            })
            .await?;

        info!(
            target: "anchordesk.dialogue",
            topic = %request.topic,
            lines = script.len(),
            "Dialogue generated"
        );
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchordesk_core::{OUTRO_SIGN_OFF, OUTRO_THANKS, Personality, Tone};

    #[test]
    fn test_prompt_mentions_counts_and_tone() {
        let request = DialogueRequest::new("Tides", 3).with_tone(Tone::Satire);
        let prompt = system_prompt(&request);
        assert!(prompt.contains("exactly 6 exchanges (3 for each anchor)"));
        assert!(prompt.contains("satirical"));
        assert!(prompt.contains("James Miller"));
        assert!(!prompt.contains("Anchor personalities"));

        let user = user_prompt(&request);
        assert!(user.starts_with("Create a satire news dialogue about: Tides"));
    }

    #[test]
    fn test_personality_block() {
        let request = DialogueRequest::new("Tides", 2)
            .with_personalities(Personality::Skeptical, Personality::Default);
        let block = personality_instructions(&request);
        assert!(block.contains("James Miller: Skeptical"));
        assert!(block.contains("Sarah Johnson: No particular personality."));
        assert!(block.ends_with(PERSONALITY_GUIDANCE));
    }

    #[test]
    fn test_parse_alternates_and_appends_outro() {
        let raw = r#"[
            {"speaker": "James", "text": "Good evening."},
            {"speaker": "Sarah", "text": "Tides are rising."},
            {"speaker": "Sarah", "text": "Mislabeled but kept."},
            {"speaker": "Sarah", "text": "Back to you."}
        ]"#;
        let script = parse_script(raw, 4).unwrap();
        assert_eq!(script.len(), 6);
        for (i, line) in script.iter().enumerate() {
            assert_eq!(line.speaker, Speaker::at_position(i));
        }
        assert_eq!(script[2].text, "Mislabeled but kept.");
        assert_eq!(script[4].text, OUTRO_SIGN_OFF);
        assert_eq!(script[5].text, OUTRO_THANKS);
    }

    #[test]
    fn test_parse_accepts_wrapped_and_fenced_output() {
        let raw = "```json\n{\"dialogue\": [{\"speaker\":\"A\",\"text\":\"One\"},{\"speaker\":\"B\",\"text\":\"Two\"}]}\n```";
        let script = parse_script(raw, 2).unwrap();
        assert_eq!(script.len(), 4);
        assert_eq!(script[1].text, "Two");
    }

    #[test]
    fn test_parse_truncates_extra_lines() {
        let raw = r#"[{"text":"1"},{"text":"2"},{"text":"3"},{"text":"4"}]"#;
        let script = parse_script(raw, 2).unwrap();
        assert_eq!(script.len(), 4);
        assert_eq!(script[1].text, "2");
        assert_eq!(script[2].text, OUTRO_SIGN_OFF);
    }

    #[test]
    fn test_parse_rejects_bad_output() {
        assert!(matches!(
            parse_script("not json", 2),
            Err(StudioError::Generation { .. })
        ));
        assert!(matches!(
            parse_script(r#"{"status": "ok"}"#, 2),
            Err(StudioError::Generation { .. })
        ));
        assert!(matches!(
            parse_script(r#"[{"text": "only one"}, {"text": "  "}]"#, 2),
            Err(StudioError::Generation { .. })
        ));
    }
}
