use std::net::IpAddr;

use uuid::Uuid;

/// Per-request data an adapter is bound to when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Caller-supplied `X-Request-Id`, or a fresh UUID.
    pub request_id: String,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: Option<String>, client_ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        RequestContext {
            request_id: request_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            client_ip,
            user_agent,
        }
    }

    /// A context with nothing known about the caller.
    pub fn anonymous() -> Self {
        Self::new(None, None, None)
    }
}
