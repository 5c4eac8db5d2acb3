//! # Observability
//!
//! - Structured JSON log lines ([`Logger`])
//! - Named lifecycle events ([`Event`])
//! - Monotonic counters ([`MetricsRegistry`])
//!
//! Observability is read-only: nothing here changes what the scoreboard
//! does, and a failed log write is ignored.
//!
//! ```ignore
//! use scoreboard::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::ServerListening, &[("addr", "127.0.0.1:8080")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_updates_applied();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for_events() {
        assert_eq!(severity_for(Event::ServerStart), Severity::Info);
        assert_eq!(severity_for(Event::ServerFailed), Severity::Fatal);
    }

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::ServerStart);
        log_event_with_fields(Event::ConfigLoaded, &[("port", "8080")]);
    }
}
