use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::warn;

use crate::auth::{AuthError, RateLimiter};
use crate::error::ApiError;

static RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Middleware state: which limiter and route key a gated route counts against
#[derive(Clone)]
pub struct RateLimitGate {
    pub limiter: Arc<RateLimiter>,
    pub route_key: &'static str,
    pub trusted_proxies: Arc<[IpAddr]>,
}

/// Rate limiting middleware function.
pub async fn rate_limit_middleware(
    State(gate): State<RateLimitGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request, &gate.trusted_proxies);

    match gate.limiter.admit(gate.route_key, &client) {
        Ok(admission) => {
            let mut response = next.run(request).await;
            if gate.limiter.rule(gate.route_key).is_some() {
                let headers = response.headers_mut();
                headers.insert(RATE_LIMIT_LIMIT.clone(), HeaderValue::from(admission.limit));
                headers.insert(RATE_LIMIT_REMAINING.clone(), HeaderValue::from(admission.remaining));
            }
            Ok(response)
        }
        Err(AuthError::TooManyRequests { retry_after }) => {
            warn!(
                client = %client,
                route = gate.route_key,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(ApiError::too_many_requests(retry_after))
        }
        Err(other) => Err(other.into()),
    }
}

/// Limiting key for a request.
///
/// `X-Forwarded-For` is only read when the TCP peer is a trusted proxy. The
/// key is then the right-most hop that is not itself a trusted proxy, since
/// everything left of it was written by the client.
fn client_key(request: &Request, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return "unknown".to_string();
    };

    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    for hop in forwarded.rsplit(',').map(str::trim).filter(|h| !h.is_empty()) {
        match hop.parse::<IpAddr>() {
            Ok(addr) if trusted_proxies.contains(&addr) => continue,
            Ok(addr) => return addr.to_string(),
            Err(_) => break,
        }
    }
    peer.to_string()
}
