//! WebSocket session
//!
//! One task reads frames from the socket and hands them to the scoreboard;
//! a second task drains the connection's outbox into the socket. When
//! either side stops, the writer is aborted, which closes the outbox and
//! abandons any retries still in flight for this connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use super::messages::{ClientMessage, ServerMessage};
use crate::coordinator::UpdateRequest;
use crate::engine::{Connection, Scoreboard};
use crate::observability::{Event, Logger};

/// Error code sent back for frames that do not parse
pub const INVALID_MESSAGE: &str = "SCORE_INVALID_MESSAGE";

/// Serve one upgraded socket until either side goes away
pub async fn run_session(socket: WebSocket, scoreboard: Arc<Scoreboard>) {
    let (connection, mut outgoing) = match scoreboard.connect() {
        Ok(pair) => pair,
        Err(e) => {
            Logger::error(
                "SESSION_SUBSCRIBE_FAILED",
                &[("code", e.code()), ("error", e.to_string().as_str())],
            );
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(message) = outgoing.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(_) => continue,
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if !handle_text(&scoreboard, &connection, &text) {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut writer => break,
        }
    }

    writer.abort();
    scoreboard.disconnect(connection);
}

/// Act on one text frame. Returns false once the connection is unusable.
pub(crate) fn handle_text(scoreboard: &Scoreboard, connection: &Connection, text: &str) -> bool {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Update {
            record_id,
            field,
            value,
        }) => match Uuid::parse_str(&record_id) {
            Ok(id) => scoreboard.submit(connection, UpdateRequest::new(id, field, value)),
            Err(_) => scoreboard.reject_unknown_record(connection, &record_id, &field),
        },
        Ok(ClientMessage::Ping { client_time }) => {
            scoreboard.ping(connection, client_time);
            true
        }
        Err(e) => {
            let message = format!("Invalid message: {}", e);
            Logger::warn(
                Event::MessageRejected.as_str(),
                &[("connection_id", connection.id()), ("error", message.as_str())],
            );
            let _ = connection
                .outbox()
                .try_send(ServerMessage::error(message, INVALID_MESSAGE));
            true
        }
    }
}
