//! Bearer token verification.
//!
//! The service never validates tokens itself; it asks a verifier. The remote
//! verifier calls the hosted auth service's `GET /auth/v1/user` endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use thiserror::Error;

use crate::auth::user::AuthenticatedUser;
use crate::config::{AuthConfig, AuthProvider};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth service request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("auth service returned {0}")]
    UnexpectedStatus(u16),

    #[error("auth provider misconfigured: {0}")]
    Config(String),
}

/// Maps a bearer token to a user.
///
/// `Ok(None)` means the token was checked and rejected.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, AuthError>;
}

/// Treats every caller as anonymous.
#[derive(Debug, Default, Clone)]
pub struct NoopVerifier;

#[async_trait]
impl TokenVerifier for NoopVerifier {
    async fn verify(&self, _token: &str) -> Result<Option<AuthenticatedUser>, AuthError> {
        Ok(None)
    }
}

/// Fixed token table, for development and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, AuthError> {
        Ok(self.tokens.get(token).map(AuthenticatedUser::new))
    }
}

/// Verifies tokens against the hosted auth service.
#[derive(Debug, Clone)]
pub struct RemoteTokenVerifier {
    client: reqwest::Client,
    user_url: String,
    api_key: String,
}

impl RemoteTokenVerifier {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_url: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for RemoteTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, AuthError> {
        let response = self
            .client
            .get(&self.user_url)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<AuthenticatedUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            other => Err(AuthError::UnexpectedStatus(other.as_u16())),
        }
    }
}

/// Build the verifier selected by `auth.provider`.
pub fn build_verifier(config: &AuthConfig) -> Result<Arc<dyn TokenVerifier>, AuthError> {
    let verifier: Arc<dyn TokenVerifier> = match config.provider {
        AuthProvider::None => Arc::new(NoopVerifier),
        AuthProvider::Static => Arc::new(StaticTokenVerifier::new(config.static_tokens.clone())),
        AuthProvider::Remote => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| AuthError::Config("auth.url is not set".into()))?;
            Arc::new(RemoteTokenVerifier::new(
                url,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?)
        }
    };
    Ok(verifier)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_static_verifier() {
        let verifier = StaticTokenVerifier::default().with_token("t1", "user-1");
        assert_eq!(verifier.verify("t1").await.unwrap(), Some(AuthenticatedUser::new("user-1")));
        assert_eq!(verifier.verify("t2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_build_remote_requires_url() {
        let config = AuthConfig {
            provider: AuthProvider::Remote,
            ..AuthConfig::default()
        };
        assert!(matches!(build_verifier(&config), Err(AuthError::Config(_))));
    }
}
