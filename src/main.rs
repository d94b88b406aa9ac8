//! Demo server with a generated service worker.
//!
//! ```text
//! sw-router --config site.toml --root ./public
//!
//!   GET /                                → public/index.html (versioned by its contents)
//!   GET /service-worker.js               → generated worker
//!   GET /service-worker-registration.js  → registration script
//!   GET /{*path}                         → public/*
//! ```

use std::path::PathBuf;

use axum::routing::get_service;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};

use sw_router::config::validation::validate_config;
use sw_router::config::watcher::StaticWatcher;
use sw_router::config::{load_config, AppConfig, ConfigError};
use sw_router::lifecycle::signals::trigger_on_signal;
use sw_router::observability::{logging, metrics};
use sw_router::{HttpServer, RouteInfo, RouteOptions, ServiceWorkerPlugin, Shutdown, SwRouter};

#[derive(Parser)]
#[command(name = "sw-router")]
#[command(about = "Serve a static site with a generated service worker", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve (overrides server.static_root).
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Bind address (overrides server.bind_address).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(root) = cli.root {
        config.server.static_root = Some(root);
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.server.bind_address,
        static_root = ?config.server.static_root,
        "sw-router starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let plugin = ServiceWorkerPlugin::register(config.service_worker.clone())?;
    let mut app = SwRouter::new(plugin.clone());

    if let Some(root) = &config.server.static_root {
        let index = root.join("index.html");
        if index.is_file() {
            app = app.route(
                RouteInfo::get("/").annotate(RouteOptions::default().dependencies([index.clone()])),
                get_service(ServeFile::new(index)),
            )?;
        }
    }

    let mut router = app.into_router();
    if let Some(root) = &config.server.static_root {
        router = router.fallback_service(ServeDir::new(root));
    }

    let _watcher = match (&config.server.static_root, config.server.watch) {
        (Some(root), true) => Some(StaticWatcher::new(plugin.gate().clone()).watch(root).run()?),
        _ => None,
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    trigger_on_signal(shutdown.clone());

    HttpServer::new(config.server.clone(), router)
        .run(listener, shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
