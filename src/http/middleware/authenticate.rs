//! Authentication middleware.
//! Attaches the verified caller, if any, for everything downstream.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::auth::{bearer_token, TokenVerifier};

/// Never rejects. Missing, invalid and unverifiable tokens all continue as
/// anonymous; handlers that need a user reject via the `AuthenticatedUser`
/// extractor.
pub async fn authenticate_middleware(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return next.run(req).await;
    };

    match verifier.verify(&token).await {
        Ok(Some(user)) => {
            tracing::debug!(user = %user.id, "request authenticated");
            req.extensions_mut().insert(user);
        }
        Ok(None) => {
            tracing::debug!("bearer token rejected, continuing anonymously");
        }
        Err(e) => {
            tracing::warn!(error = %e, "token verification failed, continuing anonymously");
        }
    }

    next.run(req).await
}
