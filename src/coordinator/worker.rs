//! Per-connection update worker
//!
//! Each connection owns a bounded queue of update requests drained by one
//! task, so a connection's updates run in the order they arrived. A full
//! queue is reported back to the sender instead of blocking the socket reader.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::coordinator::UpdateCoordinator;
use super::outcome::{FailureKind, UpdateFailed, UpdateRequest};
use crate::load::LoadSnapshot;
use crate::realtime::{Outbox, ServerMessage};

/// Sending half of a connection's request queue
pub type RequestQueue = mpsc::Sender<UpdateRequest>;

/// Start draining `requests` for `connection_id`.
///
/// The task ends when the queue's senders are gone or the outbox closes.
pub fn spawn_update_worker(
    coordinator: UpdateCoordinator,
    connection_id: String,
    mut requests: mpsc::Receiver<UpdateRequest>,
    outbox: Outbox,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            if outbox.is_closed() {
                break;
            }
            coordinator
                .request_update(&connection_id, &outbox, request)
                .await;
        }
    })
}

/// Queue `request`, or reply `busy` straight away when the queue is full.
///
/// Returns false when the connection can no longer be answered: the worker
/// has gone away, or the outbox is too full to carry the `busy` reply. The
/// caller must then close the connection so the request counts as abandoned.
pub fn submit(
    queue: &RequestQueue,
    outbox: &Outbox,
    request: UpdateRequest,
    load: LoadSnapshot,
) -> bool {
    match queue.try_send(request) {
        Ok(()) => true,
        Err(TrySendError::Full(request)) => {
            let failed = UpdateFailed::new(
                &request,
                FailureKind::Busy,
                "Too many updates in flight for this connection",
                0,
                load,
            );
            outbox
                .try_send(ServerMessage::UpdateFailed(failed))
                .is_ok()
        }
        Err(TrySendError::Closed(_)) => false,
    }
}
