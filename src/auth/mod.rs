//! Authentication boundary.
//!
//! The only fact the rest of the service consumes is whether a request
//! carries a verified [`AuthenticatedUser`], and its id.

pub mod user;
pub mod verifier;

pub use user::AuthenticatedUser;
pub use verifier::{
    bearer_token, build_verifier, AuthError, NoopVerifier, RemoteTokenVerifier,
    StaticTokenVerifier, TokenVerifier,
};
