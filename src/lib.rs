//! scoreboard - live-ranked score records edited concurrently over WebSocket
//!
//! Updates are applied with optimistic concurrency and retried with
//! backoff; commits are coalesced into debounced snapshot broadcasts.

pub mod broadcast;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod fanout;
pub mod http_server;
pub mod load;
pub mod observability;
pub mod realtime;
pub mod record;
pub mod store;
