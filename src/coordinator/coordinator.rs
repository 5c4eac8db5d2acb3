//! Optimistic update coordinator
//!
//! Turns "set field X to V" into a sequence of compare-and-swap attempts.
//! Each attempt reads the record's version fresh; a conflict backs off and
//! retries, up to the policy's retry ceiling. Retries are abandoned as soon
//! as the originating connection's outbox closes.

use std::sync::Arc;

use uuid::Uuid;

use super::outcome::{FailureKind, UpdateApplied, UpdateFailed, UpdateOutcome, UpdateRequest};
use super::policy::RetryPolicy;
use crate::broadcast::BroadcastDebouncer;
use crate::load::LoadSampler;
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::realtime::{Outbox, ServerMessage};
use crate::record::{parse_score_value, ScoreRecord};
use crate::store::{RecordStore, StoreError};

/// Runs update requests against the store
#[derive(Debug, Clone)]
pub struct UpdateCoordinator {
    store: Arc<dyn RecordStore>,
    sampler: Arc<LoadSampler>,
    debouncer: BroadcastDebouncer,
    metrics: Arc<MetricsRegistry>,
    policy: RetryPolicy,
}

impl UpdateCoordinator {
    /// Build a coordinator over shared state
    pub fn new(
        store: Arc<dyn RecordStore>,
        sampler: Arc<LoadSampler>,
        debouncer: BroadcastDebouncer,
        metrics: Arc<MetricsRegistry>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            sampler,
            debouncer,
            metrics,
            policy,
        }
    }

    /// Backoff policy used between conflicting attempts
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Apply `request` and send exactly one reply to `outbox`.
    ///
    /// No reply is sent when the outbox has closed; in that case no further
    /// attempt is made either.
    pub async fn request_update(
        &self,
        connection_id: &str,
        outbox: &Outbox,
        request: UpdateRequest,
    ) -> UpdateOutcome {
        let outcome = self.run(outbox, &request).await;
        self.report(connection_id, &outcome);

        let reply = match &outcome {
            UpdateOutcome::Applied(applied) => ServerMessage::UpdateApplied(applied.clone()),
            UpdateOutcome::Failed(failed) => ServerMessage::UpdateFailed(failed.clone()),
            UpdateOutcome::Abandoned { .. } => return outcome,
        };

        if outbox.send(reply).await.is_err() {
            Logger::warn(
                "UPDATE_REPLY_UNDELIVERED",
                &[("connection_id", connection_id)],
            );
        }
        outcome
    }

    async fn run(&self, outbox: &Outbox, request: &UpdateRequest) -> UpdateOutcome {
        let value = match parse_score_value(&request.value) {
            Ok(value) => value,
            Err(e) => return self.rejected(request, &e, 0),
        };

        let mut attempt: u32 = 0;
        loop {
            if outbox.is_closed() {
                return UpdateOutcome::Abandoned { attempts: attempt };
            }

            match self.attempt(&request.record_id, &request.field, value) {
                Ok(record) => {
                    self.sampler.record_update();
                    self.debouncer.schedule();
                    return UpdateOutcome::Applied(UpdateApplied {
                        record_id: request.record_id,
                        field: request.field.clone(),
                        // The store rejects negatives, so this is the committed value
                        value: value.unsigned_abs(),
                        attempts: attempt + 1,
                        record,
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    self.metrics.increment_conflicts();
                    attempt += 1;
                    let delay = self.policy.next_delay(attempt);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = outbox.closed() => {
                            return UpdateOutcome::Abandoned { attempts: attempt };
                        }
                    }
                }
                Err(e) => {
                    if e.is_retryable() {
                        self.metrics.increment_conflicts();
                    }
                    return self.rejected(request, &e, attempt);
                }
            }
        }
    }

    /// One read-version-then-CAS attempt
    fn attempt(
        &self,
        record_id: &Uuid,
        field: &str,
        value: i64,
    ) -> Result<ScoreRecord, StoreError> {
        let current = self.store.get(record_id)?;
        self.store.update(record_id, field, value, current.version)
    }

    fn rejected(&self, request: &UpdateRequest, err: &StoreError, retries: u32) -> UpdateOutcome {
        let kind = FailureKind::from_store_error(err);
        let message = match kind {
            FailureKind::ConflictExhausted => {
                format!("Update conflicted {} times; giving up", retries + 1)
            }
            _ => err.to_string(),
        };

        UpdateOutcome::Failed(UpdateFailed::new(
            request,
            kind,
            message,
            retries,
            self.sampler.snapshot(),
        ))
    }

    fn report(&self, connection_id: &str, outcome: &UpdateOutcome) {
        match outcome {
            UpdateOutcome::Applied(applied) => {
                self.metrics.increment_updates_applied();
                let attempts = applied.attempts.to_string();
                let version = applied.record.version.to_string();
                Logger::info(
                    Event::UpdateApplied.as_str(),
                    &[
                        ("attempts", attempts.as_str()),
                        ("connection_id", connection_id),
                        ("field", applied.field.as_str()),
                        ("record_id", applied.record_id.to_string().as_str()),
                        ("version", version.as_str()),
                    ],
                );
            }
            UpdateOutcome::Failed(failed) => {
                self.metrics.increment_updates_rejected();
                let event = if failed.kind == FailureKind::ConflictExhausted {
                    self.metrics.increment_retries_exhausted();
                    Event::UpdateConflictExhausted
                } else {
                    Event::UpdateRejected
                };
                let retries = failed.retry_count.to_string();
                Logger::warn(
                    event.as_str(),
                    &[
                        ("connection_id", connection_id),
                        ("field", failed.field.as_str()),
                        ("message", failed.message.as_str()),
                        ("record_id", failed.record_id.as_str()),
                        ("retry_count", retries.as_str()),
                    ],
                );
            }
            UpdateOutcome::Abandoned { attempts } => {
                self.metrics.increment_updates_abandoned();
                let attempts = attempts.to_string();
                Logger::info(
                    Event::UpdateAbandoned.as_str(),
                    &[("attempts", attempts.as_str()), ("connection_id", connection_id)],
                );
            }
        }
    }
}
