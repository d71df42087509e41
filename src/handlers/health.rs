//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Converter executable this instance will invoke
    pub converter: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "converter": "pandoc",
///   "timestamp": "2026-10-19T09:00:00Z"
/// }
/// ```
///
/// Does not run the converter; it only proves the process is serving requests.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        converter: state.converter.program().display().to_string(),
        timestamp: Utc::now(),
    })
}
