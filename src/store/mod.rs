//! Persistence boundary.
//!
//! Handlers talk to an opaque row store. Row-level ownership is enforced by
//! the store: every call is scoped to the owning user id.

pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryRowStore;

use crate::http::response::ApiError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Minimal row operations the API needs.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Insert a row owned by `owner`; returns the stored row with `id` and timestamps.
    async fn insert(&self, table: &str, owner: &str, row: Map<String, Value>) -> Result<Value, StoreError>;

    /// Rows owned by `owner`, newest first.
    async fn list(&self, table: &str, owner: &str, limit: usize, offset: usize) -> Result<Vec<Value>, StoreError>;

    /// Shallow-merge `patch` into a row. `None` if it does not exist or is not `owner`'s.
    async fn update(
        &self,
        table: &str,
        id: &str,
        owner: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_unavailable_maps_to_internal() {
        let err: ApiError = StoreError::Unavailable("connection refused".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
