//! Pandoxed - Markdown to PDF over HTTP.
//!
//! A single endpoint, `POST /md-to-pdf`, takes a raw Markdown document and
//! returns the PDF rendered by an external converter (pandoc).
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Conversion**: pandoc subprocess with a hard wall-clock timeout
//! - **Staging**: RAII temporary files, removed on every exit path
//! - **Authentication**: optional HTTP Basic Auth with constant-time comparison
//!
//! # Request Flow
//!
//! client → access log → (Basic Auth, if enabled) → handler → pandoc → response

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

use crate::{config::Config, state::AppState};

/// Path of the conversion endpoint.
pub const CONVERT_PATH: &str = "/md-to-pdf";

/// Build the application router from explicit configuration.
///
/// No global registration: two routers built from different configs can
/// serve side by side (the tests rely on this).
pub fn build_router(config: &Config) -> Router {
    let state = AppState::from_config(config);

    // Every method is routed to the handler so it can answer 405 itself.
    let mut convert_routes = Router::new().route(CONVERT_PATH, any(handlers::convert::md_to_pdf));

    if let Some(credentials) = config.credentials() {
        convert_routes = convert_routes.route_layer(axum_middleware::from_fn_with_state(
            Arc::new(credentials),
            middleware::auth::basic_auth,
        ));
    }

    // Added last so it wraps the auth layer and sees rejected requests too.
    let convert_routes =
        convert_routes.route_layer(axum_middleware::from_fn(middleware::access_log::access_log));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .merge(convert_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
