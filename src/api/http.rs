//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use super::rest::{devices, logs};
use super::sse::sse_handler;
use super::state::AppState;
use super::websocket::ws_handler;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Emitters and viewers are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Real-time channels
        .route("/ws", get(ws_handler))
        .route("/api/stream", get(sse_handler))
        // Health check
        .route("/health", get(health_check))
        // Logs
        .route(
            "/api/logs",
            get(logs::query_logs)
                .post(logs::ingest_logs)
                .delete(logs::clear_logs),
        )
        .route("/api/logs/save", post(logs::save_logs))
        .route("/api/logs/status", get(logs::logs_status))
        .route("/api/logs/stats", get(logs::logs_stats))
        // Devices and aliases
        .route("/api/devices", get(devices::list_devices))
        .route("/api/devices/aliases", get(devices::list_aliases))
        .route("/api/devices/alias", post(devices::set_alias))
        .route("/api/devices/aliases/batch", post(devices::set_aliases_batch))
        .route("/api/devices/alias/:emitter_id", delete(devices::delete_alias))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    status: &'static str,
    uptime: f64,
    logs_count: usize,
    devices_count: usize,
    subscribers: usize,
    timestamp: String,
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        uptime: state.uptime_secs(),
        logs_count: state.service.count(),
        devices_count: state.service.alias_count(),
        subscribers: state.service.hub().subscriber_count(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
