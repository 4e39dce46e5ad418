//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use fitness_api::auth::StaticTokenVerifier;
use fitness_api::config::ApiConfig;
use fitness_api::http::HttpServer;
use fitness_api::store::MemoryRowStore;

pub const ALICE_TOKEN: &str = "token-alice";
pub const BOB_TOKEN: &str = "token-bob";

/// Defaults with a small, fast window.
pub fn test_config(max_requests: u64, window_ms: u64) -> ApiConfig {
    let mut config = ApiConfig::default();
    config.rate_limit.max_requests = max_requests;
    config.rate_limit.window_ms = window_ms;
    config
}

/// Server with two known users and an empty in-memory store.
pub fn test_server(config: ApiConfig) -> HttpServer {
    let verifier = StaticTokenVerifier::default()
        .with_token(ALICE_TOKEN, "alice")
        .with_token(BOB_TOKEN, "bob");
    HttpServer::new(config, Arc::new(verifier), Arc::new(MemoryRowStore::new()))
}

pub fn test_app(max_requests: u64, window_ms: u64) -> Router {
    test_server(test_config(max_requests, window_ms)).router()
}

pub struct RequestSpec<'a> {
    pub method: Method,
    pub uri: &'a str,
    pub forwarded_for: Option<&'a str>,
    pub token: Option<&'a str>,
    pub body: Option<Value>,
}

impl<'a> RequestSpec<'a> {
    pub fn get(uri: &'a str) -> Self {
        Self {
            method: Method::GET,
            uri,
            forwarded_for: None,
            token: None,
            body: None,
        }
    }

    pub fn post(uri: &'a str, body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(uri)
        }
    }

    pub fn patch(uri: &'a str, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            body: Some(body),
            ..Self::get(uri)
        }
    }

    pub fn from_ip(mut self, ip: &'a str) -> Self {
        self.forwarded_for = Some(ip);
        self
    }

    pub fn as_user(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(ip) = self.forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        if let Some(token) = self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match self.body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        builder.body(body).unwrap()
    }
}

/// Drive one request through the full middleware stack.
pub async fn send(app: &Router, spec: RequestSpec<'_>) -> Response<Body> {
    app.clone().oneshot(spec.build()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header_str<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

pub fn remaining(response: &Response<Body>) -> Option<u64> {
    header_str(response, "x-ratelimit-remaining").and_then(|v| v.parse().ok())
}
