//! Admission control: allow/deny plus quota metadata for each request.
//!
//! # Algorithm
//! ```text
//! path excluded?           → Bypassed (no counter, no headers)
//! identity = resolve(req)
//! entry = store.increment(identity)
//! entry.count > max        → denied, retry_after = ceil((window_end - now) / 1s)
//! otherwise                → allowed, remaining = max - count
//! ```
//!
//! A denial is an ordinary outcome, never an error.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::RateLimitConfig;
use crate::security::exclusion::PathExclusionFilter;
use crate::security::identity::{self, Identity};
use crate::security::window::WindowStore;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Verdict and quota metadata for one counted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub identity: Identity,
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Requests counted in the current window, this one included.
    pub count: u64,
    pub reset_at: DateTime<Utc>,
    /// Present only when denied.
    pub retry_after_secs: Option<u64>,
}

impl AdmissionDecision {
    /// `reset_at` as ISO-8601 UTC with millisecond precision.
    pub fn reset_at_iso(&self) -> String {
        self.reset_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Outcome of [`AdmissionController::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Excluded path or limiter disabled. Nothing was counted.
    Bypassed,
    /// The request was counted.
    Checked(AdmissionDecision),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        match self {
            Admission::Bypassed => true,
            Admission::Checked(decision) => decision.allowed,
        }
    }

    pub fn decision(&self) -> Option<&AdmissionDecision> {
        match self {
            Admission::Bypassed => None,
            Admission::Checked(decision) => Some(decision),
        }
    }
}

/// Per-identity fixed-window admission controller.
#[derive(Clone)]
pub struct AdmissionController {
    store: WindowStore,
    filter: PathExclusionFilter,
    max_requests: u64,
    enabled: bool,
}

impl AdmissionController {
    pub fn new(store: WindowStore, filter: PathExclusionFilter, max_requests: u64) -> Self {
        Self {
            store,
            filter,
            max_requests,
            enabled: true,
        }
    }

    /// Build from config around an existing store.
    pub fn from_config(config: &RateLimitConfig, store: WindowStore) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(store, PathExclusionFilter::default(), config.max_requests)
        }
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Admit a request, resolving its identity only when it is counted.
    pub fn admit_request<B>(&self, req: &Request<B>) -> Admission {
        if self.bypasses(req.uri().path()) {
            return Admission::Bypassed;
        }
        let identity = identity::resolve_request(req);
        self.decide(identity, Utc::now())
    }

    /// Admit a request for `path` and `identity` at wall-clock time.
    pub fn admit(&self, path: &str, identity: &Identity) -> Admission {
        self.admit_at(path, identity, Utc::now())
    }

    /// Admit a request for `path` and `identity` at `now`.
    pub fn admit_at(&self, path: &str, identity: &Identity, now: DateTime<Utc>) -> Admission {
        if self.bypasses(path) {
            return Admission::Bypassed;
        }
        self.decide(identity.clone(), now)
    }

    fn bypasses(&self, path: &str) -> bool {
        !self.enabled || self.filter.is_excluded(path)
    }

    fn decide(&self, identity: Identity, now: DateTime<Utc>) -> Admission {
        let entry = self.store.increment(&identity.key(), now);

        let allowed = entry.count <= self.max_requests;
        let retry_after_secs = if allowed {
            None
        } else {
            let millis = (entry.window_end - now).num_milliseconds().max(0) as u64;
            Some(millis.div_ceil(1000).max(1))
        };

        Admission::Checked(AdmissionDecision {
            identity,
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            count: entry.count,
            reset_at: entry.window_end,
            retry_after_secs,
        })
    }
}

/// Write the `X-RateLimit-*` headers (and `Retry-After` when denied).
pub fn apply_headers(decision: &AdmissionDecision, headers: &mut HeaderMap) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    if let Ok(reset) = HeaderValue::from_str(&decision.reset_at_iso()) {
        headers.insert(X_RATELIMIT_RESET, reset);
    }
    if let Some(retry_after) = decision.retry_after_secs {
        headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    }
}
