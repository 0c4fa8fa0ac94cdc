//! Task dispatcher with per-kind FIFO backpressure.
//!
//! # Concurrency Model
//!
//! - A submission runs at once only when its kind's queue is empty and a
//!   model has spare capacity; otherwise it waits at the tail. Nothing jumps
//!   the queue, so the earliest submission always gets the next free slot.
//! - Every execution runs on its own spawned task holding a [`Lease`]. A
//!   settle guard releases the lease, records the outcome, and drains the
//!   queues when the execution ends, including by panic.
//! - Callers wait on a oneshot. Dropping the caller's future does not cancel
//!   the work; the slot is still released when the work finishes.
//! - Lock order: queues → pool (consistent everywhere). Neither lock is held
//!   across an `.await`.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use anchordesk_core::{StudioError, StudioResult, Task, TaskId, TaskKind};

use crate::pool::{CapacityPool, Lease, ModelLoad};

/// Type-erased job: receives the chosen model id, reports a summary of its
/// outcome for bookkeeping. The typed result travels on the caller's oneshot.
type Job = Box<dyn FnOnce(String) -> BoxFuture<'static, Result<(), String>> + Send>;

struct PendingTask {
    task: Task,
    job: Job,
}

/// Point-in-time view of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStatus {
    pub models: Vec<ModelLoad>,
    /// Waiting submissions per kind.
    pub queued: IndexMap<TaskKind, usize>,
    /// Tasks currently holding a slot.
    pub active: Vec<Task>,
}

impl DispatcherStatus {
    /// Nothing queued, nothing running, every counter at zero.
    pub fn is_at_rest(&self) -> bool {
        self.active.is_empty()
            && self.queued.values().all(|n| *n == 0)
            && self.models.iter().all(|m| m.current == 0)
    }
}

pub struct TaskDispatcher {
    pool: CapacityPool,
    queues: Mutex<HashMap<TaskKind, VecDeque<PendingTask>>>,
    active: Mutex<IndexMap<TaskId, Task>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TaskDispatcher {
    pub fn new(pool: CapacityPool) -> Self {
        Self {
            pool,
            queues: Mutex::new(HashMap::new()),
            active: Mutex::new(IndexMap::new()),
        }
    }

    pub const fn pool(&self) -> &CapacityPool {
        &self.pool
    }

    /// Run `work` on a model of `kind`, waiting in line if none is free.
    ///
    /// `params` describes the work for status snapshots. The work future runs
    /// on a spawned task; its result is returned here.
    pub async fn submit<T, F, Fut>(
        self: &Arc<Self>,
        kind: TaskKind,
        params: serde_json::Value,
        work: F,
    ) -> StudioResult<T>
    where
        T: Send + 'static,
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = StudioResult<T>> + Send + 'static,
    {
        let task = Task::new(kind, params);
        let task_id = task.id.clone();
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::new(move |model_id| {
            async move {
                let result = work(model_id).await;
                let summary = result.as_ref().map(|_| ()).map_err(ToString::to_string);
                // The caller may have stopped waiting.
                let _ = tx.send(result);
                summary
            }
            .boxed()
        });

        self.admit(task, job);

        rx.await.unwrap_or_else(|_| {
            Err(StudioError::internal(format!(
                "task {task_id} ended without a result"
            )))
        })
    }

    fn admit(self: &Arc<Self>, task: Task, job: Job) {
        let mut queues = lock(&self.queues);
        let queue = queues.entry(task.kind).or_default();

        if queue.is_empty() {
            if let Some(lease) = self.pool.try_acquire(task.kind) {
                drop(queues);
                self.execute(task, job, lease);
                return;
            }
        }

        debug!(
            target: "anchordesk.dispatch",
            task_id = %task.id,
            kind = %task.kind,
            depth = queue.len() + 1,
            "No capacity, task queued"
        );
        queue.push_back(PendingTask { task, job });
        drop(queues);
        self.drain_queues();
    }

    /// Start queued tasks, oldest first, while capacity remains.
    pub fn drain_queues(self: &Arc<Self>) {
        for kind in TaskKind::ALL {
            loop {
                let mut queues = lock(&self.queues);
                let Some(queue) = queues.get_mut(&kind) else {
                    break;
                };
                if queue.is_empty() {
                    break;
                }
                let Some(lease) = self.pool.try_acquire(kind) else {
                    break;
                };
                let Some(pending) = queue.pop_front() else {
                    break;
                };
                drop(queues);
                self.execute(pending.task, pending.job, lease);
            }
        }
    }

    fn execute(self: &Arc<Self>, mut task: Task, job: Job, lease: Lease) {
        task.start(lease.model_id());
        let model_id = lease.model_id().to_string();
        lock(&self.active).insert(task.id.clone(), task.clone());
        debug!(target: "anchordesk.dispatch", task_id = %task.id, %model_id, "Task started");

        let mut settle = Settle {
            dispatcher: Arc::clone(self),
            task,
            lease: Some(lease),
            outcome: None,
        };
        tokio::spawn(async move {
            settle.outcome = Some(job(model_id).await);
        });
    }

    fn settle(&self, mut task: Task, outcome: Option<Result<(), String>>) {
        match outcome {
            Some(Ok(())) => {
                task.complete();
                debug!(target: "anchordesk.dispatch", task_id = %task.id, "Task completed");
            }
            Some(Err(error)) => {
                warn!(target: "anchordesk.dispatch", task_id = %task.id, %error, "Task failed");
                task.fail(error);
            }
            None => {
                warn!(target: "anchordesk.dispatch", task_id = %task.id, "Task aborted before finishing");
                task.fail("aborted");
            }
        }
        lock(&self.active).shift_remove(&task.id);
    }

    pub fn queue_len(&self, kind: TaskKind) -> usize {
        lock(&self.queues).get(&kind).map_or(0, VecDeque::len)
    }

    pub fn active_tasks(&self) -> Vec<Task> {
        lock(&self.active).values().cloned().collect()
    }

    pub fn status(&self) -> DispatcherStatus {
        let queued = {
            let queues = lock(&self.queues);
            TaskKind::ALL
                .into_iter()
                .map(|kind| (kind, queues.get(&kind).map_or(0, VecDeque::len)))
                .collect()
        };
        DispatcherStatus {
            models: self.pool.snapshot(),
            queued,
            active: self.active_tasks(),
        }
    }

    /// Log a one-line summary of the current load.
    pub fn log_status(&self) {
        let status = self.status();
        let loads: Vec<String> = status
            .models
            .iter()
            .map(|m| format!("{}={}", m.id, m.load))
            .collect();
        info!(
            target: "anchordesk.dispatch",
            models = %loads.join(" "),
            queued_dialogue = status.queued.get(&TaskKind::Dialogue).copied().unwrap_or(0),
            queued_speech = status.queued.get(&TaskKind::Speech).copied().unwrap_or(0),
            active = status.active.len(),
            "Dispatcher status"
        );
    }
}

/// Finishes an execution when dropped, whether the job returned or unwound.
struct Settle {
    dispatcher: Arc<TaskDispatcher>,
    task: Task,
    lease: Option<Lease>,
    outcome: Option<Result<(), String>>,
}

impl Drop for Settle {
    fn drop(&mut self) {
        // Release before draining so the freed slot is visible to the drain.
        drop(self.lease.take());
        let task = self.task.clone();
        self.dispatcher.settle(task, self.outcome.take());
        self.dispatcher.drain_queues();
    }
}
