//! Startup orchestration.
//!
//! # Responsibilities
//! - Build collaborators (token verifier, row store) from configuration
//! - Construct the HTTP server, which owns the one window store
//! - Build the admin router around the same window store
//!
//! Fail fast: any startup error is fatal.

use std::sync::Arc;

use axum::Router;
use thiserror::Error;

use crate::admin::{setup_admin_router, AdminState};
use crate::auth::{build_verifier, AuthError};
use crate::config::ApiConfig;
use crate::http::HttpServer;
use crate::store::{MemoryRowStore, RowStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("auth provider: {0}")]
    Auth(#[from] AuthError),
}

/// Everything `main` needs to start serving.
pub struct Services {
    pub server: HttpServer,
    pub admin: Option<Router>,
}

pub fn build_services(config: ApiConfig) -> Result<Services, StartupError> {
    let verifier = build_verifier(&config.auth)?;
    let store: Arc<dyn RowStore> = Arc::new(MemoryRowStore::new());

    tracing::info!(provider = ?config.auth.provider, "Auth provider ready");

    let server = HttpServer::new(config, verifier, store);
    let admin = server.config().admin.enabled.then(|| {
        setup_admin_router(AdminState::new(
            server.windows().clone(),
            server.config().rate_limit.max_requests,
            &server.config().admin.api_key,
        ))
    });

    Ok(Services { server, admin })
}
