//! HTTP Basic authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the credentials from the `Authorization: Basic ...` header
//! 2. Compare username and password against the configured values in constant time
//! 3. Reject failures with HTTP 401 and a `WWW-Authenticate` challenge
//!
//! The wrapped handler never runs for a rejected request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Configured Basic Auth credentials, read once at startup.
#[derive(Clone)]
pub struct Credentials {
    username: Vec<u8>,
    password: Vec<u8>,
    realm: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str, realm: &str) -> Self {
        Self {
            username: username.as_bytes().to_vec(),
            password: password.as_bytes().to_vec(),
            realm: realm.to_string(),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Check a username/password pair.
    ///
    /// Both comparisons always run and are combined without short-circuiting,
    /// so the time taken does not depend on which one failed or how many
    /// leading bytes matched. Empty configured credentials never match.
    pub fn verify(&self, username: &[u8], password: &[u8]) -> bool {
        let user_ok = username.ct_eq(&self.username);
        let pass_ok = password.ct_eq(&self.password);
        let configured = !self.username.is_empty() & !self.password.is_empty();
        configured & bool::from(user_ok & pass_ok)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

/// Pull the username and password out of an `Authorization: Basic` header.
///
/// Returns `None` for a missing header, another scheme, bad base64 or a
/// decoded value without a `:` separator.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(Vec<u8>, Vec<u8>)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let split = decoded.iter().position(|&b| b == b':')?;
    let password = decoded[split + 1..].to_vec();
    let mut username = decoded;
    username.truncate(split);

    Some((username, password))
}

/// Basic authentication middleware function.
///
/// # Flow
///
/// 1. Parse `Authorization: Basic <base64(user:pass)>`
/// 2. Verify both halves against the configured `Credentials`
/// 3. If valid: call the next handler
/// 4. Otherwise: return `AppError::Unauthorized` (401 with challenge)
pub async fn basic_auth(
    State(credentials): State<Arc<Credentials>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = basic_credentials(request.headers())
        .is_some_and(|(username, password)| credentials.verify(&username, &password));

    if !authorized {
        tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
        return Err(AppError::Unauthorized {
            realm: credentials.realm().to_string(),
        });
    }

    Ok(next.run(request).await)
}
