//! Service info, health and route index. All of these bypass rate limiting.

use axum::extract::State;
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::response::ApiResponse;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub docs: &'static str,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub rate_limited_identities: usize,
}

pub async fn root() -> ApiResponse<ServiceInfo> {
    ApiResponse::ok(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        docs: "/api-docs",
    })
}

pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    ApiResponse::ok(HealthStatus {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        rate_limited_identities: state.windows.len(),
    })
}

pub async fn api_docs() -> ApiResponse<Value> {
    ApiResponse::ok(json!({
        "routes": [
            { "method": "GET", "path": "/", "auth": false },
            { "method": "GET", "path": "/health", "auth": false },
            { "method": "GET", "path": "/api/v1/workouts", "auth": true, "query": ["limit", "offset"] },
            { "method": "POST", "path": "/api/v1/workouts", "auth": true },
            { "method": "PATCH", "path": "/api/v1/workouts/{id}", "auth": true },
        ]
    }))
}
