//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (method, body)
//! 2. Calls into the services (staging, converter)
//! 3. Returns an HTTP response (PDF bytes, JSON, or an `AppError`)

/// Markdown to PDF conversion endpoint
pub mod convert;
/// Liveness probe
pub mod health;
