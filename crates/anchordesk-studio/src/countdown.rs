//! On-air countdown shown while a studio broadcast loads.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::debug;

use anchordesk_core::{StudioEvent, StudioEventEmitter};

/// Progress at or above which the estimate is no longer recalibrated.
const RECALIBRATION_CUTOFF: f64 = 0.9;

/// Initial loading estimate in whole seconds.
///
/// `ceil(1.2 * (3 * min(1 + topic_len / 100, 1.5) + lines * 1.5))`
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimate_loading_secs(lines: usize, topic_len: usize) -> u64 {
    let topic_factor = (1.0 + topic_len as f64 / 100.0).min(1.5);
    let generation = 3.0 * topic_factor;
    let synthesis = lines as f64 * 1.5;
    (1.2 * (generation + synthesis)).ceil() as u64
}

/// Remaining seconds implied by `progress` after `elapsed`, or `None` when
/// the estimate should be left alone.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn recalibrated_secs(elapsed: Duration, progress: f64) -> Option<u64> {
    if !(progress > 0.0 && progress < RECALIBRATION_CUTOFF) {
        return None;
    }
    let elapsed = elapsed.as_secs_f64();
    let remaining = (elapsed / progress - elapsed).ceil();
    (remaining > 0.0).then_some(remaining as u64)
}

struct Clock {
    started: Instant,
    remaining: u64,
}

/// Ticking countdown. Emits `Countdown` once a second until dropped.
pub struct Countdown {
    clock: Arc<Mutex<Clock>>,
    emitter: Arc<dyn StudioEventEmitter>,
    ticker: JoinHandle<()>,
}

impl Countdown {
    pub fn start(estimate_secs: u64, emitter: Arc<dyn StudioEventEmitter>) -> Self {
        let clock = Arc::new(Mutex::new(Clock {
            started: Instant::now(),
            remaining: estimate_secs,
        }));
        emitter.emit(StudioEvent::Countdown {
            remaining_secs: estimate_secs,
        });

        let ticker = {
            let clock = Arc::clone(&clock);
            let emitter = Arc::clone(&emitter);
            tokio::spawn(async move {
                let mut ticks = interval(Duration::from_secs(1));
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately.
                ticks.tick().await;
                loop {
                    ticks.tick().await;
                    let remaining = {
                        let mut clock = clock.lock().unwrap_or_else(PoisonError::into_inner);
                        clock.remaining = clock.remaining.saturating_sub(1);
                        clock.remaining
                    };
                    emitter.emit(StudioEvent::Countdown {
                        remaining_secs: remaining,
                    });
                    if remaining == 0 {
                        break;
                    }
                }
            })
        };

        Self {
            clock,
            emitter,
            ticker,
        }
    }

    /// Re-estimate from load progress in `0.0..=1.0`.
    pub fn recalibrate(&self, progress: f64) {
        let updated = {
            let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            let updated = recalibrated_secs(clock.started.elapsed(), progress);
            if let Some(remaining) = updated {
                clock.remaining = remaining;
            }
            updated
        };
        if let Some(remaining) = updated {
            debug!(target: "anchordesk.studio", progress, remaining, "Countdown recalibrated");
            self.emitter.emit(StudioEvent::Countdown {
                remaining_secs: remaining,
            });
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remaining
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
