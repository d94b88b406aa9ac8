//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the application router with middleware (request ID, tracing, timeout)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id, set_request_id};
use crate::lifecycle::Shutdown;

/// HTTP server for the application and plugin routes.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server around an application router.
    pub fn new(config: ServerConfig, app: Router) -> Self {
        Self {
            router: Self::build_router(&config, app),
        }
    }

    /// Apply middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, app: Router) -> Router {
        app.layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id())
    }

    /// Run the server until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
