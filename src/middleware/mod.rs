//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Authenticate requests
//! - Log requests
//! - Short-circuit requests (reject unauthorized)

/// Per-request access log line
pub mod access_log;
/// HTTP Basic authentication
pub mod auth;
