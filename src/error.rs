//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and short plain-text bodies.

use std::io;

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::services::pandoc::ConvertError;

/// Application-wide error type.
///
/// Every variant is terminal for the request: nothing is retried, and the
/// staged files are released by their owners no matter which variant fires.
///
/// # Error Categories
///
/// - **Client Errors**: wrong method, unreadable body, missing/invalid credentials
/// - **Staging Errors**: temporary file allocation, write or read failures
/// - **Converter Errors**: the external process failed or ran out of time
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Anything other than POST on the conversion endpoint.
    ///
    /// Returns HTTP 405 Method Not Allowed.
    #[error("wrong request method")]
    MethodNotAllowed,

    /// Body exceeded the ceiling or could not be read.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("can't read the body. maybe too big")]
    BodyUnreadable,

    /// Missing or invalid Basic credentials.
    ///
    /// Returns HTTP 401 with a `WWW-Authenticate` challenge naming the realm.
    #[error("Unauthorised.")]
    Unauthorized { realm: String },

    #[error("tmp in problems")]
    StageInput(#[source] io::Error),

    #[error("tmp out problems")]
    StageOutput(#[source] io::Error),

    #[error("can't write bytes to tmp file")]
    WriteInput(#[source] io::Error),

    /// The converter failed, exited non-zero or timed out.
    ///
    /// The message embeds the converter's own error detail.
    #[error("pandoc err: {0}")]
    Convert(#[from] ConvertError),

    #[error("can't read PDF bytes")]
    ReadOutput(#[source] io::Error),

    /// The converter exited cleanly but wrote nothing.
    #[error("can't read PDF bytes")]
    EmptyOutput,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BodyUnreadable => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::StageInput(_)
            | AppError::StageOutput(_)
            | AppError::WriteInput(_)
            | AppError::Convert(_)
            | AppError::ReadOutput(_)
            | AppError::EmptyOutput => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Status Code Mapping
///
/// - `MethodNotAllowed` → 405, with `Allow: POST`
/// - `BodyUnreadable` → 400
/// - `Unauthorized` → 401, with `WWW-Authenticate: Basic realm="..."`
/// - everything else → 500
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            match std::error::Error::source(&self) {
                Some(source) => tracing::error!(error = %self, source = %source, "request failed"),
                None => tracing::error!(error = %self, "request failed"),
            }
        }

        match self {
            AppError::MethodNotAllowed => (
                status,
                [(header::ALLOW, HeaderValue::from_static("POST"))],
                self.to_string(),
            )
                .into_response(),
            AppError::Unauthorized { ref realm } => {
                let challenge = HeaderValue::from_str(&format!("Basic realm=\"{realm}\""))
                    .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
                (
                    status,
                    [(header::WWW_AUTHENTICATE, challenge)],
                    format!("{self}\n"),
                )
                    .into_response()
            }
            _ => (status, self.to_string()).into_response(),
        }
    }
}
