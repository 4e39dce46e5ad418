//! Rate-limit identity resolution.
//!
//! # Precedence
//! 1. `AuthenticatedUser` already attached by the `authenticate` middleware
//! 2. First entry of `X-Forwarded-For`
//! 3. `X-Real-IP`
//! 4. The shared `"unknown"` bucket
//!
//! Resolution never fails. A caller seen first as an address and later with
//! a token is counted under two independent keys; that is expected.
//!
//! Store keys are prefixed by kind (`user:`, `ip:`) so a forwarded header
//! can never name another caller's bucket. Only `Anonymous` uses the bare
//! `"unknown"` key.

use std::fmt;

use axum::http::{Extensions, HeaderMap, Request};

use crate::auth::AuthenticatedUser;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Key used when no identity signal is present.
pub const ANONYMOUS_KEY: &str = "unknown";

pub const USER_KEY_PREFIX: &str = "user:";
pub const ADDRESS_KEY_PREFIX: &str = "ip:";

/// Who a request is counted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Authenticated user id.
    User(String),
    /// Caller network address as reported by a proxy header.
    Address(String),
    /// No usable signal. All such callers share one counter.
    Anonymous,
}

impl Identity {
    /// The string used to bucket counters in the window store.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Identity::User(_) => "user",
            Identity::Address(_) => "address",
            Identity::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::User(id) => write!(f, "{USER_KEY_PREFIX}{id}"),
            Identity::Address(addr) => write!(f, "{ADDRESS_KEY_PREFIX}{addr}"),
            Identity::Anonymous => f.write_str(ANONYMOUS_KEY),
        }
    }
}

/// Resolve the identity from request headers and extensions.
pub fn resolve(headers: &HeaderMap, extensions: &Extensions) -> Identity {
    if let Some(user) = extensions.get::<AuthenticatedUser>() {
        if !user.id.is_empty() {
            return Identity::User(user.id.clone());
        }
    }

    let forwarded = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(addr) = forwarded.or_else(|| header_str(headers, X_REAL_IP)) {
        return Identity::Address(addr.to_string());
    }

    Identity::Anonymous
}

/// Convenience wrapper over [`resolve`] for a whole request.
pub fn resolve_request<B>(req: &Request<B>) -> Identity {
    resolve(req.headers(), req.extensions())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/workouts");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_user_wins_over_address() {
        let mut req = request(&[(X_FORWARDED_FOR, "10.0.0.1")]);
        req.extensions_mut().insert(AuthenticatedUser::new("user-42"));

        assert_eq!(resolve_request(&req), Identity::User("user-42".into()));
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let req = request(&[(X_FORWARDED_FOR, " 203.0.113.7 , 10.0.0.1"), (X_REAL_IP, "10.9.9.9")]);
        assert_eq!(resolve_request(&req), Identity::Address("203.0.113.7".into()));
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = request(&[(X_REAL_IP, "198.51.100.2")]);
        assert_eq!(resolve_request(&req).key(), "ip:198.51.100.2");

        let req = request(&[(X_FORWARDED_FOR, "  "), (X_REAL_IP, "198.51.100.2")]);
        assert_eq!(resolve_request(&req).key(), "ip:198.51.100.2");
    }

    #[test]
    fn test_no_signal_is_unknown() {
        let identity = resolve_request(&request(&[]));
        assert_eq!(identity, Identity::Anonymous);
        assert_eq!(identity.key(), "unknown");
    }

    #[test]
    fn test_keys_are_namespaced_by_kind() {
        assert_eq!(Identity::User("alice".into()).key(), "user:alice");
        assert_eq!(Identity::Address("alice".into()).key(), "ip:alice");
        assert_ne!(Identity::User("alice".into()).key(), Identity::Address("alice".into()).key());

        // A forwarded "unknown" is an address, not the anonymous bucket.
        let req = request(&[(X_FORWARDED_FOR, "unknown")]);
        assert_eq!(resolve_request(&req).key(), "ip:unknown");
        assert_ne!(resolve_request(&req).key(), Identity::Anonymous.key());
    }

    #[test]
    fn test_empty_user_id_ignored() {
        let mut req = request(&[]);
        req.extensions_mut().insert(AuthenticatedUser::new(""));
        assert_eq!(resolve_request(&req), Identity::Anonymous);
    }
}
