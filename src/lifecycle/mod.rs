//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → verifier + row store → HttpServer (owns the window store)
//!         → admin router over the same window store
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → API listener, admin listener and sweeper stop
//! ```
//!
//! # Design Decisions
//! - Window state is in memory only; nothing is flushed on exit
//! - In-flight requests drain through axum's graceful shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{shutdown_signal, spawn_signal_listener};
pub use startup::{build_services, Services, StartupError};
