//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with the service's handlers
//! - Wire up access logging and panic recovery in the right order
//! - Serve with connect info so the peer address reaches the access log
//! - Stop on shutdown signal

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::Query, routing::get, Extension, Router};
use tokio::net::TcpListener;

use crate::http::context::RequestErrors;
use crate::http::middleware::{access_middleware_with, recovery_middleware_with};
use crate::lifecycle::signals::shutdown_signal;
use crate::logging::LoggerRegistry;

/// HTTP server with both middleware units installed.
pub struct HttpServer {
    router: Router,
    registry: Arc<LoggerRegistry>,
}

impl HttpServer {
    /// Build the server against an explicit registry.
    pub fn new(registry: Arc<LoggerRegistry>, capture_stack: bool) -> Self {
        Self {
            router: Self::build_router(&registry, capture_stack),
            registry,
        }
    }

    /// Routes first, then recovery, then access logging outermost.
    pub fn build_router(registry: &LoggerRegistry, capture_stack: bool) -> Router {
        Router::new()
            .route("/ping", get(ping))
            .route("/divide", get(divide))
            .route("/stream-closed", get(stream_closed))
            .layer(recovery_middleware_with(registry.error_logger().clone(), capture_stack))
            .layer(access_middleware_with(registry.logger().clone()))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        let log = self.registry.sugar();
        log.info_kv("HTTP server starting", &[("address", &addr)]);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log.info(format_args!("HTTP server stopped"));
        Ok(())
    }
}

async fn ping() -> &'static str {
    "pong"
}

/// `100 / d`. A missing or zero divisor is a runtime fault.
async fn divide(
    Query(params): Query<HashMap<String, String>>,
    Extension(errors): Extension<RequestErrors>,
) -> String {
    let divisor: u64 = match params.get("d").map(|d| d.parse()) {
        Some(Ok(d)) => d,
        Some(Err(err)) => {
            errors.private(format!("bad divisor: {err}"));
            0
        }
        None => 0,
    };
    (100 / divisor).to_string()
}

/// Simulates a write to a peer that has hung up.
async fn stream_closed() -> &'static str {
    std::panic::panic_any(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "write tcp 127.0.0.1:8080: broken pipe",
    ))
}
