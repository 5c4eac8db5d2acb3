//! # HTTP Server
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/scores` - Current ranked snapshot
//! - `/api/load` - Connection count and update rate
//! - `/observability/metrics` - Counters
//! - `/ws` - WebSocket for live updates

pub mod observability_routes;
pub mod score_routes;
pub mod server;

pub use server::HttpServer;
