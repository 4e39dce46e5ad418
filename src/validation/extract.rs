//! `Validated<T>` extractor: collect sources, merge, validate.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, RawPathParams, Request};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::validation::merge::{parse_body, RequestDataMerger, RequestSources, Source, DEFAULT_TARGETS};
use crate::validation::schema::Typed;

/// A request payload type with its merge targets and rules.
pub trait RequestInput: DeserializeOwned + Sized {
    /// Sources to merge, in order; later sources win.
    fn targets() -> &'static [Source] {
        DEFAULT_TARGETS
    }

    fn schema() -> Typed<Self>;
}

/// Extracts `T` from the merged, validated request data.
///
/// Rejects with `400 VALIDATION_ERROR` listing every violated field.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: RequestInput + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let targets = T::targets();
        let (mut parts, body) = req.into_parts();

        let mut sources = RequestSources::default();
        if targets.contains(&Source::Params) {
            if let Ok(params) = RawPathParams::from_request_parts(&mut parts, state).await {
                sources.params = params
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                    .collect();
            }
        }
        if targets.contains(&Source::Query) {
            sources.query = query_map(&parts.uri);
        }
        if targets.contains(&Source::Body) {
            let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
                .await
                .map_err(IntoResponse::into_response)?;
            sources.body = parse_body(&bytes);
        }

        let merger = RequestDataMerger::new(targets.iter().copied());
        merger
            .merge_and_validate(&sources, &T::schema())
            .map(Validated)
            .map_err(|errors| {
                tracing::debug!(errors = ?errors, "request validation failed");
                metrics::record_validation_failure();
                ApiError::Validation(errors).into_response()
            })
    }
}

/// Query string as a JSON object of strings; repeated keys keep the last value.
pub fn query_map(uri: &Uri) -> Map<String, Value> {
    match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "unparsable query string, ignoring");
            Map::new()
        }
    }
}
