//! Merge path params, query string and body into one object.
//!
//! Sources are applied in the declared order and each one overwrites keys
//! already present, so the *last* source in the list wins a collision. With
//! the default `[Params, Body]` a body field shadows the path param of the
//! same name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::schema::{FieldError, Schema};

/// Where a piece of request data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Params,
    Query,
    Body,
}

pub const DEFAULT_TARGETS: &[Source] = &[Source::Params, Source::Body];

/// The three raw inputs of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSources {
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
}

impl RequestSources {
    pub fn get(&self, source: Source) -> &Map<String, Value> {
        match source {
            Source::Params => &self.params,
            Source::Query => &self.query,
            Source::Body => &self.body,
        }
    }

    pub fn with_params(mut self, value: Value) -> Self {
        self.params = into_object(value);
        self
    }

    pub fn with_query(mut self, value: Value) -> Self {
        self.query = into_object(value);
        self
    }

    pub fn with_body(mut self, value: Value) -> Self {
        self.body = into_object(value);
        self
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Parse a request body as a JSON object.
///
/// Empty, malformed or non-object bodies become an empty object; a schema
/// that needs body fields then reports them as missing.
pub fn parse_body(bytes: &[u8]) -> Map<String, Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::debug!("request body is not a JSON object, using empty object");
            Map::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "request body is not valid JSON, using empty object");
            Map::new()
        }
    }
}

/// Ordered, last-wins merge of request sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDataMerger {
    targets: Vec<Source>,
}

impl Default for RequestDataMerger {
    fn default() -> Self {
        Self::new(DEFAULT_TARGETS.iter().copied())
    }
}

impl RequestDataMerger {
    pub fn new(targets: impl IntoIterator<Item = Source>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }

    pub fn targets(&self) -> &[Source] {
        &self.targets
    }

    pub fn merge(&self, sources: &RequestSources) -> Map<String, Value> {
        let mut merged = Map::new();
        for source in &self.targets {
            for (key, value) in sources.get(*source) {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    pub fn merge_and_validate<S: Schema>(
        &self,
        sources: &RequestSources,
        schema: &S,
    ) -> Result<S::Output, Vec<FieldError>> {
        schema.parse(&Value::Object(self.merge(sources)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::schema::{Field, ObjectSchema};
    use serde_json::json;

    fn sources() -> RequestSources {
        RequestSources::default()
            .with_params(json!({ "id": "from-params", "p": 1 }))
            .with_query(json!({ "x": "q", "id": "from-query" }))
            .with_body(json!({ "x": "b", "id": "from-body" }))
    }

    #[test]
    fn test_last_source_wins() {
        let merged = RequestDataMerger::new([Source::Query, Source::Body]).merge(&sources());
        assert_eq!(merged["x"], "b");

        let merged = RequestDataMerger::new([Source::Body, Source::Query]).merge(&sources());
        assert_eq!(merged["x"], "q");
    }

    // Comments in older handlers claim path params override the body. With
    // the default order the body wins; this pins the actual behaviour.
    #[test]
    fn test_default_order_body_overrides_params() {
        let merger = RequestDataMerger::default();
        assert_eq!(merger.targets(), &[Source::Params, Source::Body]);

        let merged = merger.merge(&sources());
        assert_eq!(merged["id"], "from-body");
        assert_eq!(merged["p"], 1);
        assert_eq!(merged["x"], "b");
    }

    #[test]
    fn test_params_last_overrides_body() {
        let merged = RequestDataMerger::new([Source::Body, Source::Params]).merge(&sources());
        assert_eq!(merged["id"], "from-params");
    }

    #[test]
    fn test_unlisted_sources_ignored() {
        let merged = RequestDataMerger::new([Source::Params]).merge(&sources());
        assert_eq!(Value::Object(merged), json!({ "id": "from-params", "p": 1 }));
    }

    #[test]
    fn test_merge_and_validate() {
        let schema = ObjectSchema::new().field("x", Field::string());
        let merger = RequestDataMerger::new([Source::Query, Source::Body]);

        let out = merger.merge_and_validate(&sources(), &schema).unwrap();
        assert_eq!(out["x"], "b");

        let empty = RequestSources::default();
        let errors = merger.merge_and_validate(&empty, &schema).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("x", "is required")]);
    }

    #[test]
    fn test_parse_body_degrades_to_empty() {
        assert!(parse_body(b"").is_empty());
        assert!(parse_body(b"  \n").is_empty());
        assert!(parse_body(b"{not json").is_empty());
        assert!(parse_body(b"[1,2]").is_empty());
        assert_eq!(parse_body(br#"{"a":1}"#)["a"], 1);
    }
}
