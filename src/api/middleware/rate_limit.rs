//! Per-client rate limiting middleware

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::observability::record_rate_limited;

/// Reject clients that exceed the configured request budget with 429
///
/// Clients are keyed by peer IP. Requests without connection info (in-process
/// calls) share the `unknown` bucket.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(request).await;
    };

    let client = client_key(&request);
    let result = limiter.check_and_record(&client).await;

    if !result.allowed {
        let path = request.uri().path().to_string();
        record_rate_limited(&path);
        warn!(client = %client, path = %path, "Rate limit exceeded");

        let mut response = ApiError::rate_limited().into_response();
        if let Ok(value) = HeaderValue::from_str(&result.reset_in_seconds.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}

fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
