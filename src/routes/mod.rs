//! HTTP routes.
//!
//! System routes (`/`, `/health`, `/api-docs`) are on the static exclusion
//! list. Everything under `/api/v1` is rate limited and requires a user.

pub mod system;
pub mod workouts;

use axum::routing::{get, patch};
use axum::Router;

use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api-docs", get(system::api_docs))
        .route(
            "/api/v1/workouts",
            get(workouts::list_workouts).post(workouts::create_workout),
        )
        .route("/api/v1/workouts/{id}", patch(workouts::update_workout))
}
