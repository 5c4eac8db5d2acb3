//! Trailing-edge broadcast debouncer
//!
//! One loop task owns the only broadcast timer. `schedule()` wakes it; every
//! wake pushes the deadline out to `now + delay`. When the deadline passes
//! with no further wake, the loop reads the converged state and fans it out.
//!
//! The snapshot is read at fire time, so one broadcast covers every commit
//! that scheduled it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::fanout::FanoutChannel;
use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry};

#[derive(Debug, Default)]
struct Shared {
    wake: Notify,
    pending: AtomicBool,
    scheduled: AtomicU64,
    fired: AtomicU64,
    closed: AtomicBool,
}

/// Handle to the broadcast loop. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BroadcastDebouncer {
    delay: Duration,
    shared: Arc<Shared>,
}

impl BroadcastDebouncer {
    /// Create a handle; nothing fires until [`spawn`](Self::spawn) is called
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Request a broadcast `delay` after the most recent request
    pub fn schedule(&self) {
        self.shared.scheduled.fetch_add(1, Ordering::Relaxed);
        self.shared.pending.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    /// Whether a broadcast is waiting to fire
    pub fn is_pending(&self) -> bool {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Number of `schedule()` calls so far
    pub fn scheduled_count(&self) -> u64 {
        self.shared.scheduled.load(Ordering::Relaxed)
    }

    /// Number of broadcasts fired so far, successful or not
    pub fn fired_count(&self) -> u64 {
        self.shared.fired.load(Ordering::Relaxed)
    }

    /// Quiet period before a scheduled broadcast fires
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stop the loop. A pending broadcast is dropped.
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    /// Start the loop delivering through `fanout`
    pub fn spawn(&self, fanout: Arc<FanoutChannel>, metrics: Arc<MetricsRegistry>) -> JoinHandle<()> {
        let delay = self.delay;
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            loop {
                shared.wake.notified().await;
                if shared.closed.load(Ordering::SeqCst) {
                    break;
                }

                let mut deadline = Instant::now() + delay;
                loop {
                    tokio::select! {
                        _ = sleep_until(deadline) => break,
                        _ = shared.wake.notified() => {
                            if shared.closed.load(Ordering::SeqCst) {
                                return;
                            }
                            deadline = Instant::now() + delay;
                        }
                    }
                }

                fire(&shared, &fanout, &metrics);
            }
        })
    }
}

fn fire(shared: &Shared, fanout: &FanoutChannel, metrics: &MetricsRegistry) {
    // Cleared before reading so a commit landing during the read schedules
    // another broadcast instead of being lost.
    shared.pending.store(false, Ordering::SeqCst);
    shared.fired.fetch_add(1, Ordering::Relaxed);

    match fanout.publish_current() {
        Ok(report) => {
            metrics.increment_broadcasts_fired();
            let delivered = report.delivered.to_string();
            let failed = report.failed.to_string();
            log_event_with_fields(
                Event::BroadcastFired,
                &[("delivered", delivered.as_str()), ("failed", failed.as_str())],
            );
        }
        Err(e) => {
            metrics.increment_broadcast_failures();
            Logger::error(
                Event::BroadcastFailed.as_str(),
                &[("code", e.code()), ("error", e.to_string().as_str())],
            );
        }
    }
}
