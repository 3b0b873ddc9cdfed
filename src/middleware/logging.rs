//! Logging middleware
//!
//! Provides request logging functionality.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{debug, info, warn};
use std::time::Instant;

/// Log each request with its status and latency
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    debug!("{} {} started", method, path);
    let response = next.run(req).await;
    let elapsed = start.elapsed();
    let status = response.status();

    if status.is_server_error() || status.is_client_error() {
        warn!("{} {} -> {} in {:?}", method, path, status.as_u16(), elapsed);
    } else {
        info!("{} {} -> {} in {:?}", method, path, status.as_u16(), elapsed);
    }

    response
}
