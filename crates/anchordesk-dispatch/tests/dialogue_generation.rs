//! Integration tests for dialogue generation through the dispatcher.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use anchordesk_core::ports::{ChatRequest, LanguageModelPort};
use anchordesk_core::{
    DialogueRequest, OUTRO_SIGN_OFF, PortError, Speaker, StudioError, TaskKind, Tone,
};
use anchordesk_dispatch::DialogueGenerator;

struct ScriptedModel {
    reply: Result<String, PortError>,
    seen: Mutex<Vec<(String, ChatRequest)>>,
}

impl ScriptedModel {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LanguageModelPort for ScriptedModel {
    async fn complete(&self, model_id: &str, request: &ChatRequest) -> Result<String, PortError> {
        self.seen
            .lock()
            .unwrap()
            .push((model_id.to_string(), request.clone()));
        self.reply.clone()
    }
}

#[tokio::test]
async fn generated_script_alternates_and_ends_with_outro() {
    let reply = serde_json::json!([
        {"speaker": "James", "text": "Tonight, the tides."},
        {"speaker": "Sarah", "text": "They are rising."},
        {"speaker": "James", "text": "Faster than expected."},
        {"speaker": "Sarah", "text": "Scientists agree."},
        {"speaker": "James", "text": "Coastal towns prepare."},
        {"speaker": "Sarah", "text": "That's all for now."},
    ])
    .to_string();
    let model = ScriptedModel::replying(&reply);
    let dispatcher = common::dispatcher(1, 1);
    let generator = DialogueGenerator::new(Arc::clone(&dispatcher), model.clone());

    let request = DialogueRequest::new("Tides", 3).with_tone(Tone::Dramatic);
    let script = generator.generate(&request).await.unwrap();

    assert_eq!(script.len(), request.total_line_count());
    assert_eq!(script[0].speaker, Speaker::A);
    for pair in script.windows(2) {
        assert_ne!(pair[0].speaker, pair[1].speaker);
    }
    assert_eq!(script[6].text, OUTRO_SIGN_OFF);

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "writer");
    assert!(seen[0].1.json_mode);
    assert!(seen[0].1.messages[0].content.contains("dramatic"));

    tokio::task::yield_now().await;
    assert_eq!(dispatcher.queue_len(TaskKind::Dialogue), 0);
    assert_eq!(dispatcher.pool().in_use(), 0);
}

#[tokio::test]
async fn short_or_failed_replies_are_generation_errors() {
    let dispatcher = common::dispatcher(1, 1);

    let short = ScriptedModel::replying(r#"[{"speaker":"James","text":"Only me."}]"#);
    let err = DialogueGenerator::new(Arc::clone(&dispatcher), short)
        .generate(&DialogueRequest::new("Tides", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Generation { .. }));

    let down = Arc::new(ScriptedModel {
        reply: Err(PortError::Unavailable("connection refused".into())),
        seen: Mutex::new(Vec::new()),
    });
    let err = DialogueGenerator::new(Arc::clone(&dispatcher), down)
        .generate(&DialogueRequest::new("Tides", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Generation { .. }));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn zero_lines_per_anchor_is_rejected_before_dispatch() {
    let model = ScriptedModel::replying("[]");
    let generator = DialogueGenerator::new(common::dispatcher(1, 1), model.clone());
    let err = generator
        .generate(&DialogueRequest::new("Tides", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Validation { .. }));
    assert!(model.seen.lock().unwrap().is_empty());
}
