//! Integration tests for studio and feed broadcasts.
//!
//! # What is tested
//!
//! - A studio broadcast walks every phase and leaves the guard at rest
//! - A start while another broadcast holds the guard is rejected unchanged
//! - Canceling during synthesis re-arms only after the cleanup delay
//! - An exhausted handshake: the feed plays offline, the studio fails
//! - Replaying the broadcast on air stops it
//! - Ready queue items are chained after the studio broadcast
//! - A stop between chained items halts the chain without a cancel
//! - Blocked topics never reach the handshake

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use anchordesk_core::{
    BUSY_LOCKED_MESSAGE, Broadcast, BroadcastPhase, DialogueLine, FeedFilter, HandshakeError,
    Speaker, StudioError, StudioEvent, Visibility,
};
use anchordesk_handshake::{LogEvent, MockCoordinator};
use anchordesk_studio::{BroadcastOutcome, CANCELED_STATUS, StopKind};

use common::{Harness, SilentCoordinator, Timings};

async fn saved(h: &Harness) -> Broadcast {
    let dialogue: Vec<_> = (0..4)
        .map(|i| DialogueLine::new(Speaker::at_position(i), format!("Saved line {i}.")))
        .collect();
    h.library
        .save("user-1", "Harbor news", &dialogue, Visibility::Public)
        .await
        .unwrap()
}

fn played(outcome: BroadcastOutcome) -> (usize, usize) {
    match outcome {
        BroadcastOutcome::Completed { report, chained } => {
            assert!(!report.halted);
            (report.played, chained)
        }
        other => panic!("expected a completed broadcast, got {other:?}"),
    }
}

// ── Studio ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn studio_broadcast_walks_every_phase() {
    let h = Harness::new();

    let outcome = h.studio.start("Tides", Visibility::Public).await.unwrap();
    assert_eq!(played(outcome), (4, 0));

    use BroadcastPhase::*;
    assert_eq!(
        h.recorder.phases(),
        [Locking, Handshake, Generating, Synthesizing, Playing, Complete, Idle]
    );
    assert!(h.pipeline.snapshot().guard.is_at_rest());

    let events = h.recorder.events();
    assert!(events.iter().any(|e| matches!(e, StudioEvent::Countdown { .. })));
    assert!(events.iter().any(|e| matches!(e, StudioEvent::BroadcastSaved { .. })));
    assert!(h.recorder.contains(&StudioEvent::BreakingNews {
        topic: "Tides".into()
    }));

    let feed = h.library.list(Some("user-1"), FeedFilter::default()).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].dialogue.len(), 4);
    assert_eq!(h.audio.played.lock().unwrap().len(), 4);

    let log: Vec<_> = h
        .pipeline
        .handshake()
        .event_log()
        .iter()
        .map(|e| e.event)
        .collect();
    assert_eq!(log, [LogEvent::Start, LogEvent::Ack, LogEvent::Live, LogEvent::End]);
}

#[tokio::test(start_paused = true)]
async fn start_while_busy_changes_nothing() {
    let h = Harness::new();
    let broadcast = saved(&h).await;

    let feed = Arc::clone(&h.feed);
    let running = tokio::spawn(async move { feed.play(&broadcast).await });
    h.wait_for_phase(BroadcastPhase::Synthesizing).await;

    let before = h.pipeline.snapshot();
    let err = h.studio.start("Other", Visibility::Public).await.unwrap_err();
    assert!(matches!(err, StudioError::Busy { .. }));
    assert_eq!(err.user_message(), BUSY_LOCKED_MESSAGE);
    assert_eq!(h.pipeline.snapshot(), before);
    assert!(h.recorder.statuses().iter().any(|s| s == BUSY_LOCKED_MESSAGE));

    assert_eq!(played(running.await.unwrap().unwrap()), (4, 0));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_synthesis_rearms_after_cleanup() {
    let h = Harness::build(
        Arc::new(MockCoordinator::new()),
        &Timings {
            tts_ms: 2_000,
            ..Timings::default()
        },
    );

    let studio = Arc::clone(&h.studio);
    let running = tokio::spawn(async move { studio.start("Tides", Visibility::Private).await });
    h.wait_for_phase(BroadcastPhase::Synthesizing).await;

    assert!(h.pipeline.cancel_loading());
    let canceled_at = Instant::now();

    // Cleanup still holds the guard.
    let err = h.studio.start("Again", Visibility::Private).await.unwrap_err();
    assert!(matches!(err, StudioError::Busy { .. }));

    assert_eq!(running.await.unwrap().unwrap(), BroadcastOutcome::Canceled);
    assert!(canceled_at.elapsed() >= Duration::from_millis(300));
    let snapshot = h.pipeline.snapshot();
    assert!(snapshot.guard.is_at_rest());
    assert_eq!(snapshot.phase, BroadcastPhase::Idle);

    assert!(h.recorder.phases().contains(&BroadcastPhase::Canceled));
    assert!(h.recorder.statuses().iter().any(|s| s == CANCELED_STATUS));
    assert!(h.recorder.contains(&StudioEvent::CanceledIndicator { visible: true }));
    assert!(!h.recorder.contains(&StudioEvent::CanceledIndicator { visible: false }));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(h.recorder.contains(&StudioEvent::CanceledIndicator { visible: false }));

    let end = h
        .pipeline
        .handshake()
        .event_log()
        .into_iter()
        .rfind(|e| e.event == LogEvent::End)
        .unwrap();
    assert_eq!(end.details["stats"]["canceled"], true);
    assert_eq!(end.details["stats"]["phase"], "preparation");

    let outcome = h.studio.start("Again", Visibility::Private).await.unwrap();
    assert_eq!(played(outcome), (4, 0));
}

#[tokio::test(start_paused = true)]
async fn exhausted_handshake_feed_plays_offline_studio_fails() {
    let h = Harness::build(Arc::new(SilentCoordinator), &Timings::default());
    let broadcast = saved(&h).await;

    let outcome = h.feed.play(&broadcast).await.unwrap();
    assert_eq!(played(outcome), (4, 0));
    assert!(h.recorder.contains(&StudioEvent::OfflineMode {
        broadcast_id: broadcast.id.clone()
    }));
    assert!(h.pipeline.snapshot().guard.is_at_rest());

    let err = h.studio.start("Tides", Visibility::Public).await.unwrap_err();
    assert!(matches!(
        err,
        StudioError::Handshake(HandshakeError::Exhausted { attempts: 3, .. })
    ));
    let phases = h.recorder.phases();
    assert_eq!(phases[phases.len() - 2..], [BroadcastPhase::Failed, BroadcastPhase::Idle]);
    assert!(h.pipeline.snapshot().guard.is_at_rest());
    // Only the feed broadcast reached the speakers.
    assert_eq!(h.audio.played.lock().unwrap().len(), 4);
}

// ── Feed ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn replaying_the_broadcast_on_air_stops_it() {
    let h = Harness::new();
    let broadcast = saved(&h).await;

    let feed = Arc::clone(&h.feed);
    let first = broadcast.clone();
    let running = tokio::spawn(async move { feed.play(&first).await });
    h.wait_for_phase(BroadcastPhase::Playing).await;

    assert_eq!(h.feed.play(&broadcast).await.unwrap(), BroadcastOutcome::Stopped);
    assert_eq!(running.await.unwrap().unwrap(), BroadcastOutcome::Stopped);

    assert!(h.pipeline.snapshot().guard.is_at_rest());
    assert!(h.audio.played.lock().unwrap().len() < 4);
    assert!(*h.audio.stops.lock().unwrap() >= 1);
}

#[tokio::test(start_paused = true)]
async fn feed_plays_saved_broadcast_by_id() {
    let h = Harness::new();
    let broadcast = saved(&h).await;

    let outcome = h.feed.play_saved(&broadcast.id, None).await.unwrap();
    assert_eq!(played(outcome), (4, 0));

    let err = h.feed.play_saved("missing", None).await.unwrap_err();
    assert!(matches!(err, StudioError::NotFound { .. }));
}

// ── Queue chaining ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn ready_queue_items_follow_the_studio_broadcast() {
    let h = Harness::new();
    h.queue.enqueue("Second story").unwrap();
    while h.queue.peek_ready().is_none() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let outcome = h.studio.start("First story", Visibility::Public).await.unwrap();
    assert_eq!(played(outcome), (4, 1));
    assert!(h.queue.snapshot().is_empty());
    assert_eq!(h.audio.played.lock().unwrap().len(), 8);

    let feed = h.library.list(Some("user-1"), FeedFilter::default()).await.unwrap();
    assert_eq!(feed.len(), 2);

    let queued_start = h
        .pipeline
        .handshake()
        .event_log()
        .into_iter()
        .filter(|e| e.event == LogEvent::Start)
        .nth(1)
        .unwrap();
    assert!(queued_start.broadcast_id.unwrap().starts_with("queued-queue-"));

    use BroadcastPhase::*;
    let phases = h.recorder.phases();
    let chain = [Playing, Handshake, Synthesizing, Playing, Complete, Idle];
    assert_eq!(phases[phases.len() - chain.len()..], chain);
}

#[tokio::test(start_paused = true)]
async fn stop_between_chained_items_is_a_playback_stop() {
    let h = Harness::new();
    h.queue.enqueue("Second story").unwrap();
    h.queue.enqueue("Third story").unwrap();
    while h.queue.status().ready < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let studio = Arc::clone(&h.studio);
    let running = tokio::spawn(async move { studio.start("First story", Visibility::Public).await });
    let ends = |h: &Harness| {
        h.pipeline
            .handshake()
            .event_log()
            .iter()
            .filter(|e| e.event == LogEvent::End)
            .count()
    };
    // The first broadcast has reported its end; the chain is pausing.
    while ends(&h) == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(!h.pipeline.cancel_loading());
    assert_eq!(h.pipeline.stop(), StopKind::Playback);
    assert_eq!(running.await.unwrap().unwrap(), BroadcastOutcome::Stopped);

    assert_eq!(ends(&h), 1);
    assert!(!h.recorder.contains(&StudioEvent::CanceledIndicator { visible: true }));
    assert!(!h.recorder.statuses().iter().any(|s| s == CANCELED_STATUS));
    assert_eq!(h.queue.snapshot().len(), 2);
    assert_eq!(h.audio.played.lock().unwrap().len(), 4);
    assert!(h.pipeline.snapshot().guard.is_at_rest());
}

// ── Content policy ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn blocked_topic_fails_before_handshake() {
    let h = Harness::new();

    let err = h
        .studio
        .start("watch https://youtube.com/watch?v=abc", Visibility::Public)
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::ContentPolicy { .. }));

    use BroadcastPhase::*;
    assert_eq!(h.recorder.phases(), [Locking, Failed, Idle]);
    assert!(h.pipeline.handshake().event_log().is_empty());
    assert!(h.pipeline.snapshot().guard.is_at_rest());
}

#[tokio::test]
async fn blank_topic_is_rejected_without_taking_the_guard() {
    let h = Harness::new();
    let err = h.studio.start("   ", Visibility::Public).await.unwrap_err();
    assert!(matches!(err, StudioError::Validation { .. }));
    assert!(h.recorder.phases().is_empty());
}
