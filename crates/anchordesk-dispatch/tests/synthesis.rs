//! Integration tests for per-line speech synthesis.
//!
//! # What is tested
//!
//! - Out-of-order completions are re-sorted to dialogue order
//! - Voices follow the speaker of each line
//! - Load failures and load timeouts yield unusable handles
//! - Failed lines become skipped segments; all lines failing is an error
//! - Cancellation stops collection and leaves no slot held

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use anchordesk_core::{DialogueLine, Speaker, StudioError, Voice};
use anchordesk_dispatch::SpeechSynthesizer;

use common::{MockAudio, MockTts};

const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

fn script(texts: &[&str]) -> Vec<DialogueLine> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| DialogueLine::new(Speaker::at_position(i), *text))
        .collect()
}

fn synthesizer(tts: Arc<MockTts>) -> SpeechSynthesizer {
    SpeechSynthesizer::new(
        common::dispatcher(1, 2),
        tts,
        Arc::new(MockAudio::default()),
        LOAD_TIMEOUT,
    )
}

#[tokio::test(start_paused = true)]
async fn bundle_is_index_aligned_despite_completion_order() {
    // Earlier lines take longer, so completions arrive in reverse.
    let tts = Arc::new(MockTts::new(|text| match text {
        "one" => 400,
        "two" => 300,
        "three" => 200,
        "four" => 100,
        _ => 0,
    }));
    let synth = synthesizer(Arc::clone(&tts));
    let lines = script(&["one", "two", "three", "four"]);
    let progress = Mutex::new(Vec::new());

    let bundle = synth
        .synthesize_all(&lines, &CancellationToken::new(), |loaded, total| {
            progress.lock().unwrap().push((loaded, total));
        })
        .await
        .unwrap();

    let texts: Vec<_> = bundle.segments().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["one", "two", "three", "four"]);
    for (segment, line) in bundle.segments().iter().zip(&lines) {
        assert_eq!(segment.speaker, line.speaker);
        assert_eq!(
            segment.playable_handle().map(|h| h.uri.as_str()),
            Some(format!("mock://{}", line.text).as_str())
        );
    }
    assert_eq!(
        *progress.lock().unwrap(),
        vec![(1, 4), (2, 4), (3, 4), (4, 4)]
    );

    let voices = tts.calls.lock().unwrap().clone();
    assert_eq!(voices.len(), 4);
    assert!(voices.contains(&("one".to_string(), Voice::EnMale)));
    assert!(voices.contains(&("two".to_string(), Voice::EnFemale)));
}

#[tokio::test(start_paused = true)]
async fn unloadable_clips_are_kept_but_unusable() {
    let synth = synthesizer(Arc::new(MockTts::instant()));
    let lines = script(&["fine", "broken clip", "stall forever"]);

    let bundle = synth
        .synthesize_all(&lines, &CancellationToken::new(), |_, _| {})
        .await
        .unwrap();

    assert_eq!(bundle.len(), 3);
    assert_eq!(bundle.playable_count(), 1);
    let broken = bundle.segments()[1].handle.as_ref().unwrap();
    assert!(!broken.playable);
    let stalled = bundle.segments()[2].handle.as_ref().unwrap();
    assert!(!stalled.playable);
}

#[tokio::test(start_paused = true)]
async fn failed_lines_are_skipped_unless_all_fail() {
    let synth = synthesizer(Arc::new(MockTts::instant()));

    let bundle = synth
        .synthesize_all(
            &script(&["ok", "fail here", "ok again"]),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap();
    assert_eq!(bundle.len(), 3);
    assert!(bundle.segments()[1].handle.is_none());
    assert_eq!(bundle.playable_count(), 2);

    let err = synth
        .synthesize_all(
            &script(&["fail a", "fail b"]),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Synthesis { .. }));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_and_frees_slots() {
    let dispatcher = common::dispatcher(1, 1);
    let synth = SpeechSynthesizer::new(
        Arc::clone(&dispatcher),
        Arc::new(MockTts::new(|_| 1_000)),
        Arc::new(MockAudio::default()),
        LOAD_TIMEOUT,
    );
    let lines = script(&["a", "b", "c", "d"]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        trigger.cancel();
    });

    let err = synth
        .synthesize_all(&lines, &cancel, |_, _| {})
        .await
        .unwrap_err();
    assert!(err.is_cancelled());

    // Already-dispatched renders finish in the background.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(dispatcher.status().is_at_rest());
}

#[tokio::test]
async fn empty_or_precanceled_input_is_rejected() {
    let synth = synthesizer(Arc::new(MockTts::instant()));
    assert!(
        synth
            .synthesize_all(&[], &CancellationToken::new(), |_, _| {})
            .await
            .is_err()
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = synth
        .synthesize_all(&script(&["x"]), &cancel, |_, _| {})
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}
