//! Full server over TCP.

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use sw_router::config::ServerConfig;
use sw_router::{HttpServer, ServiceWorkerPlugin, Shutdown, SwOptions};

mod common;

#[tokio::test]
async fn test_server_serves_worker_and_shuts_down() {
    let generator = common::CountingGenerator::new();
    let plugin = ServiceWorkerPlugin::with_generator(SwOptions::default(), generator.clone()).unwrap();
    let app: Router = plugin.routes();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(ServerConfig::default(), app);
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    let response = common::raw_get(addr, "/service-worker.js").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    let lower = response.to_lowercase();
    assert!(lower.contains("content-type: application/javascript"));
    assert!(lower.contains("x-request-id: "));
    assert!(response.ends_with("// generation 1 for []"));

    let missing = common::raw_get(addr, "/nope").await;
    assert!(missing.starts_with("HTTP/1.1 404"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(generator.calls(), 1);
}
