//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (RATE_LIMIT_*, PORT, AUTH_*, LOG_*)
//!     → validation.rs (semantic checks)
//!     → ApiConfig (validated, immutable)
//!     → shared by value/Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    AdminConfig, ApiConfig, AuthConfig, AuthProvider, ListenerConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, TimeoutConfig,
};
