//! Integration tests for dispatcher admission order and slot accounting.
//!
//! # What is tested
//!
//! - Waiting submissions start strictly in submission order
//! - Counters return to zero after a burst of mixed successes and failures
//! - A caller that stops waiting does not leak its slot

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;

use anchordesk_core::{StudioError, TaskKind};

#[tokio::test(start_paused = true)]
async fn queued_tasks_start_in_submission_order() {
    let dispatcher = common::dispatcher(1, 1);
    let started = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for n in 0..6 {
        let d = Arc::clone(&dispatcher);
        let started = Arc::clone(&started);
        handles.push(tokio::spawn(async move {
            d.submit(TaskKind::Dialogue, serde_json::json!({ "n": n }), move |_| async move {
                started.lock().unwrap().push(n);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(n)
            })
            .await
        }));
        // Let each submission reach the queue before the next one.
        tokio::task::yield_now().await;
    }

    assert_eq!(dispatcher.queue_len(TaskKind::Dialogue), 5);

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap().unwrap(), n);
    }
    assert_eq!(*started.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test(start_paused = true)]
async fn burst_of_mixed_outcomes_returns_to_rest() {
    let dispatcher = common::dispatcher(2, 3);

    let submissions = (0..40u64).map(|n| {
        let d = Arc::clone(&dispatcher);
        async move {
            let kind = if n % 3 == 0 {
                TaskKind::Dialogue
            } else {
                TaskKind::Speech
            };
            d.submit(kind, serde_json::Value::Null, move |_| async move {
                tokio::time::sleep(Duration::from_millis(10 + n % 7)).await;
                if n % 5 == 0 {
                    Err(StudioError::synthesis("flaky"))
                } else {
                    Ok(n)
                }
            })
            .await
        }
    });

    let results = join_all(submissions).await;
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 8);

    tokio::task::yield_now().await;
    let status = dispatcher.status();
    assert!(status.is_at_rest(), "not at rest: {status:?}");
}

#[tokio::test(start_paused = true)]
async fn abandoned_submission_still_releases_its_slot() {
    let dispatcher = common::dispatcher(1, 1);
    let ran = Arc::new(Mutex::new(Vec::new()));

    let blocker = {
        let d = Arc::clone(&dispatcher);
        let ran = Arc::clone(&ran);
        tokio::spawn(async move {
            d.submit(TaskKind::Dialogue, serde_json::Value::Null, move |_| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                ran.lock().unwrap().push("blocker");
                Ok(())
            })
            .await
        })
    };
    tokio::task::yield_now().await;

    let abandoned = {
        let d = Arc::clone(&dispatcher);
        let ran = Arc::clone(&ran);
        tokio::spawn(async move {
            d.submit(TaskKind::Dialogue, serde_json::Value::Null, move |_| async move {
                ran.lock().unwrap().push("abandoned");
                Ok(())
            })
            .await
        })
    };
    tokio::task::yield_now().await;
    assert_eq!(dispatcher.queue_len(TaskKind::Dialogue), 1);
    abandoned.abort();

    blocker.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(*ran.lock().unwrap(), vec!["blocker", "abandoned"]);
    assert!(dispatcher.status().is_at_rest());
}
