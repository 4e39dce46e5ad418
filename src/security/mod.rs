//! Request admission control.
//!
//! # Data Flow
//! ```text
//! Incoming request (after authenticate):
//!     → exclusion.rs (system paths skip everything below)
//!     → identity.rs (user id → forwarded address → "unknown")
//!     → window.rs (atomic fixed-window increment for that key)
//!     → admission.rs (allow/deny + X-RateLimit-* metadata)
//!     → rate_limit.rs (middleware: 429 or pass through, headers on both)
//! ```
//!
//! # Design Decisions
//! - Single process, in-memory; a restart clears all counters
//! - The window store is constructed once and injected, never global
//! - Denial is a normal outcome carried in a value, not an error

pub mod admission;
pub mod exclusion;
pub mod identity;
pub mod rate_limit;
pub mod window;

pub use admission::{Admission, AdmissionController, AdmissionDecision};
pub use exclusion::PathExclusionFilter;
pub use identity::Identity;
pub use window::{RateWindowEntry, WindowStore, WindowSummary};
