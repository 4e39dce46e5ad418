//! Rate limiting middleware.
//!
//! Must be layered *inside* `authenticate` so that the
//! `AuthenticatedUser` extension is present when the identity is resolved.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::admission::{apply_headers, Admission, AdmissionController};

/// Middleware function for per-identity fixed-window rate limiting.
pub async fn rate_limit_middleware(
    State(controller): State<Arc<AdmissionController>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let decision = match controller.admit_request(&request) {
        Admission::Bypassed => return next.run(request).await,
        Admission::Checked(decision) => decision,
    };

    if decision.allowed {
        metrics::record_admission("allowed", decision.identity.kind());
        let mut response = next.run(request).await;
        apply_headers(&decision, response.headers_mut());
        return response;
    }

    let retry_after = decision.retry_after_secs.unwrap_or(1);
    tracing::warn!(
        identity = %decision.identity,
        kind = decision.identity.kind(),
        count = decision.count,
        limit = decision.limit,
        retry_after,
        "Rate limit exceeded"
    );
    metrics::record_admission("denied", decision.identity.kind());

    let mut response = ApiError::RateLimited { retry_after }.into_response();
    apply_headers(&decision, response.headers_mut());
    response
}
