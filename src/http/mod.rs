//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware order)
//!     → request.rs (request ID, tracing span)
//!     → middleware/ (metrics, authenticate)
//!     → security::rate_limit (admission control)
//!     → routes (handlers, validated input)
//!     → response.rs (envelope, error → status mapping)
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ApiResponse};
pub use server::{AppState, HttpServer};
