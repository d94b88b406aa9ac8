//! Plugin endpoints.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::plugin::{ServiceWorkerPlugin, REGISTRATION_PATH, WORKER_PATH};

/// Static registration script, served verbatim.
pub const REGISTRATION_SCRIPT: &str = include_str!("../../assets/service-worker-registration.js");

pub const JAVASCRIPT: &str = "application/javascript; charset=utf-8";

/// `GET /service-worker.js`
pub async fn service_worker(State(plugin): State<ServiceWorkerPlugin>) -> Response {
    match plugin.gate().current().await {
        Ok(artifact) => {
            metrics::record_request(WORKER_PATH, 200);
            script_response(artifact.script.to_string())
        }
        Err(e) => {
            if let Some(fallback) = plugin.gate().options().default_worker.clone() {
                tracing::warn!(error = %e, "Serving default worker after generation failure");
                metrics::record_request(WORKER_PATH, 200);
                return script_response(fallback);
            }
            metrics::record_request(WORKER_PATH, 500);
            (StatusCode::INTERNAL_SERVER_ERROR, "Service worker generation failed").into_response()
        }
    }
}

/// `GET /service-worker-registration.js`
pub async fn registration_script() -> Response {
    metrics::record_request(REGISTRATION_PATH, 200);
    ([(header::CONTENT_TYPE, JAVASCRIPT)], REGISTRATION_SCRIPT).into_response()
}

fn script_response(body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE.as_str(), JAVASCRIPT),
            (header::CACHE_CONTROL.as_str(), "no-cache"),
            ("Service-Worker-Allowed", "/"),
        ],
        body,
    )
        .into_response()
}
