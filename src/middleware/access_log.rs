//! One log line per finished request.

use std::{net::SocketAddr, time::Instant};

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use chrono::{SecondsFormat, Utc};

/// Record timestamp, remote address, method, path, status and elapsed time.
///
/// Runs outermost on the conversion route, so the line is written for every
/// outcome, including requests the Auth Gate turns away.
pub async fn access_log(request: Request, next: Next) -> Response {
    let started_at = Utc::now();
    let clock = Instant::now();

    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    tracing::info!(
        timestamp = %started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        remote = %remote,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed = ?clock.elapsed(),
        "request finished"
    );

    response
}
