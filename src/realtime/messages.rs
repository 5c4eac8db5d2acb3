//! # WebSocket Messages
//!
//! JSON frames exchanged with editors and viewers. Every frame carries a
//! `type` tag.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::coordinator::{UpdateApplied, UpdateFailed};
use crate::load::{ConnectionQuality, EchoReply, QualityThresholds};
use crate::record::Snapshot;

/// Per-connection queue of outgoing frames
pub type Outbox = mpsc::Sender<ServerMessage>;

/// Receiving end of an [`Outbox`]
pub type OutboxReceiver = mpsc::Receiver<ServerMessage>;

/// Message from client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Set one score field
    Update {
        /// Parsed by the session; a malformed id is answered `not_found`
        record_id: String,
        field: String,
        value: Value,
    },

    /// Keepalive and latency check
    Ping {
        #[serde(default)]
        client_time: Option<i64>,
    },
}

/// Message to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full ranked view; replaces whatever the client showed before
    Snapshot(Snapshot),

    /// The sender's update committed
    UpdateApplied(UpdateApplied),

    /// The sender's update was not applied
    UpdateFailed(UpdateFailed),

    /// Reply to a ping
    Echo {
        #[serde(skip_serializing_if = "Option::is_none")]
        client_time: Option<i64>,
        server_time: i64,
        connections: usize,
        updates_per_second: u64,
        /// Only present when the ping carried `client_time`
        #[serde(skip_serializing_if = "Option::is_none")]
        quality: Option<ConnectionQuality>,
    },

    /// Malformed input
    Error { message: String, code: String },
}

impl ServerMessage {
    /// Echo a ping. With a `client_time`, the apparent one-way latency and
    /// the current update rate are classified into a quality band.
    ///
    /// A `client_time` too far from the server clock to subtract gets no band.
    pub fn echo(client_time: Option<i64>, reply: EchoReply) -> Self {
        let quality = client_time.and_then(|sent| {
            let elapsed = reply.server_time.checked_sub(sent)?;
            let elapsed = u64::try_from(elapsed).unwrap_or(0);
            Some(ConnectionQuality::classify(
                Duration::from_millis(elapsed),
                reply.updates_per_second,
                &QualityThresholds::default(),
            ))
        });

        ServerMessage::Echo {
            client_time,
            server_time: reply.server_time,
            connections: reply.connections,
            updates_per_second: reply.updates_per_second,
            quality,
        }
    }

    /// Error frame for input that could not be handled
    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            code: code.into(),
        }
    }
}
