//! Named lifecycle events
//!
//! Every log line the server emits for a lifecycle step uses one of these
//! names, so log consumers can match on a closed set.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Process
    ConfigLoaded,
    StoreSeeded,
    ServerStart,
    ServerListening,
    ServerStop,
    ServerFailed,

    // Connections
    ConnectionOpened,
    ConnectionClosed,
    MessageRejected,

    // Updates
    UpdateApplied,
    UpdateRejected,
    UpdateConflictExhausted,
    UpdateAbandoned,

    // Broadcasts
    BroadcastFired,
    BroadcastFailed,
}

impl Event {
    /// Stable event name written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreSeeded => "STORE_SEEDED",
            Event::ServerStart => "SERVER_START",
            Event::ServerListening => "SERVER_LISTENING",
            Event::ServerStop => "SERVER_STOP",
            Event::ServerFailed => "SERVER_FAILED",
            Event::ConnectionOpened => "CONNECTION_OPENED",
            Event::ConnectionClosed => "CONNECTION_CLOSED",
            Event::MessageRejected => "MESSAGE_REJECTED",
            Event::UpdateApplied => "UPDATE_APPLIED",
            Event::UpdateRejected => "UPDATE_REJECTED",
            Event::UpdateConflictExhausted => "UPDATE_CONFLICT_EXHAUSTED",
            Event::UpdateAbandoned => "UPDATE_ABANDONED",
            Event::BroadcastFired => "BROADCAST_FIRED",
            Event::BroadcastFailed => "BROADCAST_FAILED",
        }
    }

    /// Events after which the process exits
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ServerFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
