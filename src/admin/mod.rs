//! Operator API, served on its own listener and never rate limited.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::security::WindowStore;
use self::auth::admin_auth_middleware;
use self::handlers::*;

#[derive(Clone)]
pub struct AdminState {
    pub windows: WindowStore,
    pub max_requests: u64,
    pub api_key: Arc<str>,
    pub started_at: Instant,
}

impl AdminState {
    pub fn new(windows: WindowStore, max_requests: u64, api_key: &str) -> Self {
        Self {
            windows,
            max_requests,
            api_key: Arc::from(api_key),
            started_at: Instant::now(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/rate-limits", get(get_rate_limits))
        .route(
            "/admin/rate-limits/{identity}",
            get(get_identity).delete(reset_identity),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
