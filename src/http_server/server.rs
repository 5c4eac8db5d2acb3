//! # HTTP Server
//!
//! Combines the health, API, observability and WebSocket routers behind a
//! CORS layer and serves them until the shutdown signal resolves.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::observability_routes::{health_routes, observability_routes};
use super::score_routes::{api_routes, websocket_routes};
use crate::engine::Scoreboard;
use crate::observability::{log_event_with_fields, Event};

/// HTTP and WebSocket front end for a [`Scoreboard`]
pub struct HttpServer {
    addr: String,
    router: Router,
}

impl HttpServer {
    /// Build the router and CORS layer for `scoreboard`
    pub fn new(scoreboard: Arc<Scoreboard>) -> Self {
        let addr = scoreboard.config().socket_addr();
        let router = Self::build_router(scoreboard);
        Self { addr, router }
    }

    fn build_router(scoreboard: Arc<Scoreboard>) -> Router {
        let origins = &scoreboard.config().cors_origins;
        let cors = if origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(websocket_routes(Arc::clone(&scoreboard)))
            .nest("/api", api_routes(Arc::clone(&scoreboard)))
            .nest("/observability", observability_routes(scoreboard))
            .layer(cors)
    }

    /// Address the listener binds to
    pub fn socket_addr(&self) -> &str {
        &self.addr
    }

    /// The assembled router, for serving elsewhere or testing
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.addr.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.addr, e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?.to_string();
        log_event_with_fields(Event::ServerListening, &[("addr", bound.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::ScoreboardConfig;
    use crate::record::NewRecord;
    use crate::store::MemoryRecordStore;

    fn server() -> HttpServer {
        let store = MemoryRecordStore::with_records(vec![
            NewRecord::named("alpha"),
            NewRecord::named("beta"),
        ])
        .unwrap();
        let config = ScoreboardConfig {
            port: 9090,
            ..ScoreboardConfig::default()
        };
        HttpServer::new(Arc::new(Scoreboard::new(config, Arc::new(store))))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_socket_addr_from_config() {
        assert_eq!(server().socket_addr(), "127.0.0.1:9090");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(server().router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_scores_returns_ranked_snapshot() {
        let (status, body) = get_json(server().router(), "/api/scores").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sequence"], 0);
        let records = body["records"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["rank"], 1);
        assert_eq!(records[0]["total"], 0);
    }

    #[tokio::test]
    async fn test_load() {
        let (status, body) = get_json(server().router(), "/api/load").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connections"], 0);
        assert!(body["server_time"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_metrics() {
        let (status, body) = get_json(server().router(), "/observability/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updates_applied"], 0);
    }
}
