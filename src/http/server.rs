//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware in a fixed order
//! - Bind server to listener and run until shutdown
//! - Run the rate-limit sweeper alongside the server
//!
//! # Middleware order (outermost first)
//! ```text
//! set request id → propagate request id → trace → metrics → body limit
//!     → timeout → authenticate → rate limit → handler
//! ```
//! `authenticate` must wrap `rate limit`: otherwise the identity resolver
//! never sees the user and every caller is limited by address.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::http::middleware::{authenticate_middleware, track_metrics};
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::routes;
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::{AdmissionController, WindowStore};
use crate::store::RowStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RowStore>,
    pub windows: WindowStore,
    pub started_at: Instant,
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    config: ApiConfig,
    windows: WindowStore,
}

impl HttpServer {
    /// Create a new HTTP server. The window store is created here, once.
    pub fn new(config: ApiConfig, verifier: Arc<dyn TokenVerifier>, store: Arc<dyn RowStore>) -> Self {
        let windows = WindowStore::from_config(&config.rate_limit);
        let admission = Arc::new(AdmissionController::from_config(&config.rate_limit, windows.clone()));

        let state = AppState {
            store,
            windows: windows.clone(),
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state, admission, verifier);
        Self {
            router,
            config,
            windows,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later wrap earlier ones, so they run first.
    fn build_router(
        config: &ApiConfig,
        state: AppState,
        admission: Arc<AdmissionController>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Router {
        routes::router()
            .with_state(state)
            .layer(from_fn_with_state(admission, rate_limit_middleware))
            .layer(from_fn_with_state(verifier, authenticate_middleware))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(DefaultBodyLimit::max(config.timeouts.max_body_bytes))
            .layer(from_fn(track_metrics))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, e.g. for driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The window store shared by the rate limiter, health route and admin API.
    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit_enabled = self.config.rate_limit.enabled,
            window_ms = self.config.rate_limit.window_ms,
            max_requests = self.config.rate_limit.max_requests,
            "HTTP server starting"
        );

        let sweeper = self.config.rate_limit.enabled.then(|| {
            self.windows.spawn_sweeper(
                Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
                shutdown.resubscribe(),
            )
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}
