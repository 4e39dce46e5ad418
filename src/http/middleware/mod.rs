//! Request middleware that is not specific to admission control.

pub mod authenticate;
pub mod metrics;

pub use authenticate::authenticate_middleware;
pub use metrics::track_metrics;
