//! Scoreboard service wiring
//!
//! One store, one sampler, one fan-out channel, one debouncer and one
//! coordinator, shared by every connection. Transport code talks to the
//! [`Scoreboard`] and never to the parts directly.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::broadcast::BroadcastDebouncer;
use crate::config::ScoreboardConfig;
use crate::coordinator::{
    spawn_update_worker, submit, RequestQueue, UpdateCoordinator, UpdateFailed, UpdateOutcome,
    UpdateRequest,
};
use crate::fanout::FanoutChannel;
use crate::load::{spawn_sampler, EchoReply, LoadSampler, LoadSnapshot};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::realtime::{Outbox, OutboxReceiver, ServerMessage};
use crate::record::Snapshot;
use crate::store::{RecordStore, StoreResult};

#[derive(Debug)]
pub struct Scoreboard {
    config: ScoreboardConfig,
    store: Arc<dyn RecordStore>,
    sampler: Arc<LoadSampler>,
    metrics: Arc<MetricsRegistry>,
    fanout: Arc<FanoutChannel>,
    debouncer: BroadcastDebouncer,
    coordinator: UpdateCoordinator,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Scoreboard {
    /// Wire the parts together without starting any background task
    pub fn new(config: ScoreboardConfig, store: Arc<dyn RecordStore>) -> Self {
        let sampler = Arc::new(LoadSampler::new());
        let metrics = Arc::new(MetricsRegistry::new());
        let fanout = Arc::new(FanoutChannel::new(
            Arc::clone(&store),
            Arc::clone(&sampler),
            Arc::clone(&metrics),
        ));
        let debouncer = BroadcastDebouncer::new(config.broadcast_delay());
        let coordinator = UpdateCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&sampler),
            debouncer.clone(),
            Arc::clone(&metrics),
            config.retry_policy(),
        );

        Self {
            config,
            store,
            sampler,
            metrics,
            fanout,
            debouncer,
            coordinator,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Build a scoreboard and start its broadcast and sampling loops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: ScoreboardConfig, store: Arc<dyn RecordStore>) -> Arc<Self> {
        let scoreboard = Arc::new(Self::new(config, store));

        let broadcast = scoreboard
            .debouncer
            .spawn(Arc::clone(&scoreboard.fanout), Arc::clone(&scoreboard.metrics));
        let sampling = spawn_sampler(
            Arc::clone(&scoreboard.sampler),
            scoreboard.config.sample_interval(),
        );

        if let Ok(mut tasks) = scoreboard.tasks.lock() {
            tasks.push(broadcast);
            tasks.push(sampling);
        }
        scoreboard
    }

    /// Stop the background loops. A pending broadcast is dropped.
    pub fn shutdown(&self) {
        self.debouncer.shutdown();
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    /// Apply one update on behalf of `connection_id`, replying on `outbox`
    pub async fn request_update(
        &self,
        connection_id: &str,
        outbox: &Outbox,
        request: UpdateRequest,
    ) -> UpdateOutcome {
        self.coordinator
            .request_update(connection_id, outbox, request)
            .await
    }

    /// Register `outbox` for snapshots; it receives the current view at once
    pub fn subscribe(&self, connection_id: &str, outbox: Outbox) -> StoreResult<()> {
        self.fanout.subscribe(connection_id, outbox)
    }

    /// Stop sending snapshots to `connection_id`
    pub fn unsubscribe(&self, connection_id: &str) {
        self.fanout.unsubscribe(connection_id);
    }

    /// Keepalive payload: server time, connections and update rate
    pub fn echo(&self) -> EchoReply {
        self.sampler.echo()
    }

    /// Current connection count and update rate
    pub fn load(&self) -> LoadSnapshot {
        self.sampler.snapshot()
    }

    /// Current ranked view
    pub fn snapshot(&self) -> StoreResult<Snapshot> {
        self.store.snapshot()
    }

    /// Configuration the scoreboard was built with
    pub fn config(&self) -> &ScoreboardConfig {
        &self.config
    }

    /// Counters shared by every part
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Debouncer that schedules snapshot broadcasts
    pub fn debouncer(&self) -> &BroadcastDebouncer {
        &self.debouncer
    }

    /// Register a new connection: subscribe it and start its update worker.
    ///
    /// The receiver carries everything addressed to the connection, starting
    /// with the join snapshot. Dropping it closes the outbox, which abandons
    /// any retries still in flight.
    pub fn connect(&self) -> StoreResult<(Connection, OutboxReceiver)> {
        let id = Uuid::new_v4().to_string();
        let (outbox, outgoing) = mpsc::channel(self.config.outbox_capacity);

        self.fanout.subscribe(&id, outbox.clone())?;

        let (queue, requests) = mpsc::channel(self.config.request_queue_capacity);
        let worker = spawn_update_worker(
            self.coordinator.clone(),
            id.clone(),
            requests,
            outbox.clone(),
        );

        let connections = self.sampler.connections().to_string();
        log_event_with_fields(
            Event::ConnectionOpened,
            &[("connection_id", id.as_str()), ("connections", connections.as_str())],
        );

        Ok((
            Connection {
                id,
                outbox,
                queue,
                worker,
            },
            outgoing,
        ))
    }

    /// Queue an update for `connection`; a full queue is answered `busy`.
    ///
    /// Returns false when the request cannot be answered at all. The caller
    /// must then [`disconnect`](Self::disconnect); the request is counted as
    /// abandoned.
    pub fn submit(&self, connection: &Connection, request: UpdateRequest) -> bool {
        if submit(&connection.queue, &connection.outbox, request, self.load()) {
            return true;
        }
        self.metrics.increment_updates_abandoned();
        log_event_with_fields(
            Event::UpdateAbandoned,
            &[("attempts", "0"), ("connection_id", connection.id.as_str())],
        );
        false
    }

    /// Answer an update whose `record_id` is not a UUID with `not_found`.
    ///
    /// Returns false, like [`submit`](Self::submit), when the reply cannot be
    /// queued.
    pub fn reject_unknown_record(
        &self,
        connection: &Connection,
        record_id: &str,
        field: &str,
    ) -> bool {
        let failed = UpdateFailed::unknown_record(record_id, field, self.load());
        if connection
            .outbox
            .try_send(ServerMessage::UpdateFailed(failed))
            .is_err()
        {
            self.metrics.increment_updates_abandoned();
            return false;
        }

        self.metrics.increment_updates_rejected();
        log_event_with_fields(
            Event::UpdateRejected,
            &[
                ("connection_id", connection.id.as_str()),
                ("field", field),
                ("record_id", record_id),
            ],
        );
        true
    }

    /// Answer a ping on `connection`
    pub fn ping(&self, connection: &Connection, client_time: Option<i64>) -> bool {
        connection
            .outbox
            .try_send(ServerMessage::echo(client_time, self.echo()))
            .is_ok()
    }

    /// Unsubscribe `connection` and stop feeding its worker
    pub fn disconnect(&self, connection: Connection) {
        self.fanout.unsubscribe(&connection.id);

        let connections = self.sampler.connections().to_string();
        log_event_with_fields(
            Event::ConnectionClosed,
            &[
                ("connection_id", connection.id.as_str()),
                ("connections", connections.as_str()),
            ],
        );
        // Dropping the queue lets the worker drain and exit
        drop(connection.queue);
    }
}

impl Drop for Scoreboard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One live client of the scoreboard
#[derive(Debug)]
pub struct Connection {
    id: String,
    outbox: Outbox,
    queue: RequestQueue,
    worker: JoinHandle<()>,
}

impl Connection {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// True once the update worker has drained and exited
    pub fn is_worker_finished(&self) -> bool {
        self.worker.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::FailureKind;
    use crate::record::NewRecord;
    use crate::store::MemoryRecordStore;
    use std::time::Duration;

    fn seeded() -> (Arc<MemoryRecordStore>, Uuid) {
        let store = Arc::new(MemoryRecordStore::new());
        let record = store.insert(NewRecord::named("alpha")).unwrap();
        (store, record.id)
    }

    #[tokio::test]
    async fn test_connect_receives_join_snapshot() {
        let (store, _) = seeded();
        let scoreboard = Scoreboard::new(ScoreboardConfig::default(), store);

        let (connection, mut outgoing) = scoreboard.connect().unwrap();
        assert!(matches!(outgoing.recv().await, Some(ServerMessage::Snapshot(_))));
        assert_eq!(scoreboard.load().connections, 1);

        scoreboard.disconnect(connection);
        assert_eq!(scoreboard.load().connections, 0);
    }

    #[tokio::test]
    async fn test_submit_replies_applied() {
        let (store, id) = seeded();
        let scoreboard = Scoreboard::new(ScoreboardConfig::default(), store);
        let (connection, mut outgoing) = scoreboard.connect().unwrap();
        let _ = outgoing.recv().await;

        assert!(scoreboard.submit(&connection, UpdateRequest::new(id, "technical", 8)));
        match outgoing.recv().await {
            Some(ServerMessage::UpdateApplied(applied)) => {
                assert_eq!(applied.value, 8);
                assert_eq!(applied.record.total, 8);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
        assert!(scoreboard.debouncer().is_pending());
    }

    #[tokio::test]
    async fn test_invalid_field_is_reported() {
        let (store, id) = seeded();
        let scoreboard = Scoreboard::new(ScoreboardConfig::default(), store);
        let (connection, mut outgoing) = scoreboard.connect().unwrap();
        let _ = outgoing.recv().await;

        scoreboard.submit(&connection, UpdateRequest::new(id, "foo", 1));
        match outgoing.recv().await {
            Some(ServerMessage::UpdateFailed(failed)) => {
                assert_eq!(failed.kind, FailureKind::InvalidField);
                assert_eq!(failed.server_load.connections, 1);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
        assert!(!scoreboard.debouncer().is_pending());
    }

    #[tokio::test]
    async fn test_submit_with_saturated_connection_is_abandoned() {
        let (store, id) = seeded();
        let config = ScoreboardConfig {
            request_queue_capacity: 1,
            outbox_capacity: 1,
            ..ScoreboardConfig::default()
        };
        let scoreboard = Scoreboard::new(config, store);
        // The join snapshot fills the outbox and stays unread
        let (connection, mut outgoing) = scoreboard.connect().unwrap();

        let mut accepted = 0;
        let mut refused = false;
        for value in 1..=4 {
            if scoreboard.submit(&connection, UpdateRequest::new(id, "design", value)) {
                accepted += 1;
            } else {
                refused = true;
                break;
            }
        }
        assert!(refused);
        assert!(scoreboard.metrics().snapshot().updates_abandoned >= 1);

        scoreboard.disconnect(connection);
        assert!(matches!(outgoing.recv().await, Some(ServerMessage::Snapshot(_))));
        assert!(accepted >= 1);
    }

    #[tokio::test]
    async fn test_ping_echoes_client_time() {
        let (store, _) = seeded();
        let scoreboard = Scoreboard::new(ScoreboardConfig::default(), store);
        let (connection, mut outgoing) = scoreboard.connect().unwrap();
        let _ = outgoing.recv().await;

        assert!(scoreboard.ping(&connection, Some(42)));
        match outgoing.recv().await {
            Some(ServerMessage::Echo {
                client_time,
                connections,
                ..
            }) => {
                assert_eq!(client_time, Some(42));
                assert_eq!(connections, 1);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_scoreboard_broadcasts() {
        let (store, id) = seeded();
        let scoreboard = Scoreboard::start(ScoreboardConfig::default(), store);
        let (connection, mut outgoing) = scoreboard.connect().unwrap();
        let _ = outgoing.recv().await;

        scoreboard.submit(&connection, UpdateRequest::new(id, "design", 4));
        assert!(matches!(outgoing.recv().await, Some(ServerMessage::UpdateApplied(_))));

        tokio::time::sleep(Duration::from_millis(150)).await;
        match outgoing.recv().await {
            Some(ServerMessage::Snapshot(snapshot)) => {
                assert_eq!(snapshot.records[0].record.total, 4);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
        assert_eq!(scoreboard.metrics().snapshot().broadcasts_fired, 1);

        scoreboard.shutdown();
    }
}
