use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::admin::AdminState;
use crate::security::{RateWindowEntry, WindowSummary};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct RateLimitOverview {
    pub max_requests: u64,
    pub window_ms: i64,
    #[serde(flatten)]
    pub windows: WindowSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStatus {
    #[serde(flatten)]
    pub entry: RateWindowEntry,
    pub remaining: u64,
    pub expired: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn get_rate_limits(State(state): State<AdminState>) -> Json<RateLimitOverview> {
    Json(RateLimitOverview {
        max_requests: state.max_requests,
        window_ms: state.windows.window().num_milliseconds(),
        windows: state.windows.summary(Utc::now()),
    })
}

pub async fn get_identity(
    State(state): State<AdminState>,
    Path(identity): Path<String>,
) -> Result<Json<IdentityStatus>, StatusCode> {
    let entry = state.windows.get(&identity).ok_or(StatusCode::NOT_FOUND)?;
    let expired = entry.is_expired(Utc::now());
    let remaining = if expired {
        state.max_requests
    } else {
        state.max_requests.saturating_sub(entry.count)
    };

    Ok(Json(IdentityStatus {
        entry,
        remaining,
        expired,
    }))
}

pub async fn reset_identity(State(state): State<AdminState>, Path(identity): Path<String>) -> StatusCode {
    if state.windows.reset(&identity) {
        tracing::info!(identity = %identity, "rate limit window reset by operator");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
