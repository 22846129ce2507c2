use std::convert::Infallible;
use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use http::header::USER_AGENT;
use http::request::Parts;
use serde_json::Value;
use tracing::debug;

use crate::platforms::RequestContext;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Parse a request body as JSON. An empty or unparsable body becomes `null`,
/// leaving it to the route's own checks to reject it.
pub fn parse_json_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Ignoring request body that is not valid JSON: {}", e);
        Value::Null
    })
}

/// Extractor implementation: collects what the platform adapter needs to
/// know about the caller.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let request_id = header(REQUEST_ID_HEADER);
        let user_agent = header(USER_AGENT.as_str());

        // Get the client IP for logging and forwarding
        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        if client_ip.is_none() {
            debug!("Unable to determine client IP address.");
        }

        Ok(RequestContext::new(request_id, client_ip, user_agent))
    }
}
