//! In-process row store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::store::{RowStore, StoreError};

#[derive(Debug, Clone)]
struct Row {
    owner: String,
    created_at: DateTime<Utc>,
    data: Map<String, Value>,
}

/// Rows keyed by `(table, id)`.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    rows: DashMap<(String, String), Row>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn insert(&self, table: &str, owner: &str, mut row: Map<String, Value>) -> Result<Value, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        row.insert("id".into(), Value::String(id.clone()));
        row.insert("user_id".into(), Value::String(owner.to_string()));
        row.insert("created_at".into(), timestamp(now));
        row.insert("updated_at".into(), timestamp(now));

        self.rows.insert(
            (table.to_string(), id),
            Row {
                owner: owner.to_string(),
                created_at: now,
                data: row.clone(),
            },
        );
        Ok(Value::Object(row))
    }

    async fn list(&self, table: &str, owner: &str, limit: usize, offset: usize) -> Result<Vec<Value>, StoreError> {
        let mut rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|entry| entry.key().0 == table && entry.owner == owner)
            .map(|entry| entry.value().clone())
            .collect();

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| Value::Object(row.data))
            .collect())
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        owner: &str,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let key = (table.to_string(), id.to_string());
        let Some(mut row) = self.rows.get_mut(&key) else {
            return Ok(None);
        };
        if row.owner != owner {
            return Ok(None);
        }

        for (k, v) in patch {
            if matches!(k.as_str(), "id" | "user_id" | "created_at") {
                continue;
            }
            row.data.insert(k, v);
        }
        row.data.insert("updated_at".into(), timestamp(Utc::now()));
        Ok(Some(Value::Object(row.data.clone())))
    }
}
