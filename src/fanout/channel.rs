//! Subscriber set and snapshot delivery
//!
//! Delivery is best-effort: each subscriber gets a non-blocking `try_send`
//! and one slow or closed subscriber never holds up the rest.
//!
//! Subscribing and publishing the current state are mutually exclusive, so a
//! new subscriber's join snapshot is never followed by an older broadcast.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc::error::TrySendError;

use crate::load::LoadSampler;
use crate::observability::{Logger, MetricsRegistry};
use crate::realtime::{Outbox, ServerMessage};
use crate::record::Snapshot;
use crate::store::{RecordStore, StoreError, StoreResult};

/// Result of one fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers that accepted the message
    pub delivered: usize,
    /// Subscribers whose queue was full or closed
    pub failed: usize,
}

/// Live subscribers of the ranked view
#[derive(Debug)]
pub struct FanoutChannel {
    subscribers: RwLock<HashMap<String, Outbox>>,
    store: Arc<dyn RecordStore>,
    sampler: Arc<LoadSampler>,
    metrics: Arc<MetricsRegistry>,
}

impl FanoutChannel {
    /// Empty channel reading snapshots from `store`
    pub fn new(
        store: Arc<dyn RecordStore>,
        sampler: Arc<LoadSampler>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            store,
            sampler,
            metrics,
        }
    }

    /// Add a subscriber and send it the current snapshot right away.
    ///
    /// Re-subscribing an existing id replaces its outbox without counting a
    /// second connection.
    pub fn subscribe(&self, connection_id: &str, outbox: Outbox) -> StoreResult<()> {
        let mut subscribers = self.subscribers.write().map_err(|_| StoreError::poisoned())?;

        let snapshot = self.store.snapshot()?;
        if let Err(e) = outbox.try_send(ServerMessage::Snapshot(snapshot)) {
            self.metrics.increment_deliveries_failed();
            Logger::warn(
                "FANOUT_JOIN_DELIVERY_FAILED",
                &[("connection_id", connection_id), ("reason", send_failure(&e))],
            );
        }

        if subscribers.insert(connection_id.to_string(), outbox).is_none() {
            self.sampler.connection_opened();
        }
        Ok(())
    }

    /// Remove a subscriber
    pub fn unsubscribe(&self, connection_id: &str) {
        let removed = match self.subscribers.write() {
            Ok(mut subscribers) => subscribers.remove(connection_id).is_some(),
            Err(_) => false,
        };
        if removed {
            self.sampler.connection_closed();
        }
    }

    /// Deliver `snapshot` to every current subscriber
    pub fn emit(&self, snapshot: &Snapshot) -> DeliveryReport {
        match self.subscribers.read() {
            Ok(subscribers) => self.deliver(&subscribers, snapshot),
            Err(_) => DeliveryReport::default(),
        }
    }

    /// Read the current ranked state and deliver it to every subscriber
    pub fn publish_current(&self) -> StoreResult<DeliveryReport> {
        let subscribers = self.subscribers.read().map_err(|_| StoreError::poisoned())?;
        let snapshot = self.store.snapshot()?;
        Ok(self.deliver(&subscribers, &snapshot))
    }

    /// Current ranked state, without delivering it
    pub fn current(&self) -> StoreResult<Snapshot> {
        self.store.snapshot()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }

    fn deliver(&self, subscribers: &HashMap<String, Outbox>, snapshot: &Snapshot) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (connection_id, outbox) in subscribers {
            match outbox.try_send(ServerMessage::Snapshot(snapshot.clone())) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    self.metrics.increment_deliveries_failed();
                    Logger::warn(
                        "FANOUT_DELIVERY_FAILED",
                        &[("connection_id", connection_id.as_str()), ("reason", send_failure(&e))],
                    );
                }
            }
        }

        report
    }
}

fn send_failure<T>(err: &TrySendError<T>) -> &'static str {
    match err {
        TrySendError::Full(_) => "full",
        TrySendError::Closed(_) => "closed",
    }
}
