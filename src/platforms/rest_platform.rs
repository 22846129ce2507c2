use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::context::RequestContext;
use super::platforms::{AdapterRejection, AuthorizedRequest, PasswordResetRequest, UserAdapter};

/// The config needed to forward account operations to an upstream REST API.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct RestPlatformConfig {
    /// Platform id.
    pub name: String,
    /// Base URI of the upstream API, e.g. `https://shop.example.com/rest/V1`.
    pub uri: String,
}

/// A platform adapter that calls the upstream account API for every capability.
pub struct RestPlatformAdapter {
    config: RestPlatformConfig,
    client: reqwest::Client,
    context: RequestContext,
}

impl RestPlatformAdapter {
    pub fn new(config: &RestPlatformConfig, client: reqwest::Client, context: RequestContext) -> Self {
        Self {
            config: config.clone(),
            client,
            context,
        }
    }

    /// Start a request to `path`, carrying the request context and, when
    /// given, the customer's token.
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.config.uri.trim_end_matches('/'), path);
        debug!("Sending {} {} (request {})", method, url, self.context.request_id);

        let mut builder = self
            .client
            .request(method, url)
            .header("X-Request-Id", self.context.request_id.as_str());
        if let Some(ip) = self.context.client_ip {
            builder = builder.header("X-Forwarded-For", ip.to_string());
        }
        if let Some(user_agent) = &self.context.user_agent {
            builder = builder.header(header::USER_AGENT, user_agent.as_str());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send the request. A 2xx answer yields its JSON body; anything else is a
    /// rejection carrying whatever the upstream sent back.
    async fn send(&self, builder: RequestBuilder) -> Result<Value, AdapterRejection> {
        let response = builder
            .send()
            .await
            .map_err(|e| AdapterRejection::from(format!("Error sending request: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterRejection::from(format!("Error reading response body: {}", e)))?;

        let payload = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };

        if status.is_success() {
            Ok(payload)
        } else {
            warn!(
                "Platform '{}' answered {} (request {})",
                self.config.name, status, self.context.request_id
            );
            match payload {
                Value::Null => Err(AdapterRejection::from(format!("Unexpected status code: {}", status))),
                payload => Err(AdapterRejection(payload)),
            }
        }
    }
}

#[async_trait]
impl UserAdapter for RestPlatformAdapter {
    fn platform(&self) -> &str {
        &self.config.name
    }

    async fn register(&self, body: Value) -> Result<Value, AdapterRejection> {
        self.send(self.request(Method::POST, "/customers", None).json(&body))
            .await
    }

    async fn login(&self, credentials: Value) -> Result<Value, AdapterRejection> {
        self.send(self.request(Method::POST, "/customers/token", None).json(&credentials))
            .await
    }

    async fn me(&self, token: &str) -> Result<Value, AdapterRejection> {
        self.send(self.request(Method::GET, "/customers/me", Some(token)))
            .await
    }

    async fn order_history(&self, token: &str) -> Result<Value, AdapterRejection> {
        self.send(self.request(Method::GET, "/customers/me/orders", Some(token)))
            .await
    }

    async fn update(&self, request: AuthorizedRequest) -> Result<Value, AdapterRejection> {
        self.send(
            self.request(Method::PUT, "/customers/me", Some(&request.token))
                .json(&request.body),
        )
        .await
    }

    async fn change_password(&self, request: AuthorizedRequest) -> Result<Value, AdapterRejection> {
        self.send(
            self.request(Method::PUT, "/customers/me/password", Some(&request.token))
                .json(&request.body),
        )
        .await
    }

    async fn reset_password(&self, request: PasswordResetRequest) -> Result<Value, AdapterRejection> {
        info!(
            "Forwarding password reset for '{}' to '{}' (request {})",
            request.email, self.config.name, self.context.request_id
        );
        self.send(self.request(Method::PUT, "/customers/password", None).json(&request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::net::{IpAddr, Ipv4Addr};

    fn adapter(uri: &str) -> RestPlatformAdapter {
        let config = RestPlatformConfig {
            name: "upstream".to_string(),
            uri: uri.to_string(),
        };
        let context = RequestContext::new(
            Some("req-1".to_string()),
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))),
            Some("test-agent".to_string()),
        );
        RestPlatformAdapter::new(&config, reqwest::Client::new(), context)
    }

    #[tokio::test]
    async fn test_login_forwards_credentials_and_context() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/customers/token")
            .match_header("x-request-id", "req-1")
            .match_header("x-forwarded-for", "10.0.0.7")
            .match_header("user-agent", "test-agent")
            .match_body(Matcher::Json(json!({ "username": "jane", "password": "pw" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#""upstream-session""#)
            .create_async()
            .await;

        let result = adapter(&server.url())
            .login(json!({ "username": "jane", "password": "pw" }))
            .await;

        assert_eq!(result.unwrap(), json!("upstream-session"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_me_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/customers/me")
            .match_header("authorization", "Bearer customer-token")
            .with_status(200)
            .with_body(r#"{"id": 3, "email": "jane@example.com"}"#)
            .create_async()
            .await;

        let profile = adapter(&format!("{}/", server.url()))
            .me("customer-token")
            .await
            .unwrap();

        assert_eq!(profile["id"], 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_is_rejected_verbatim() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", "/customers/me/password")
            .with_status(401)
            .with_body(r#"{"message": "The consumer isn't authorized"}"#)
            .create_async()
            .await;

        let result = adapter(&server.url())
            .change_password(AuthorizedRequest {
                token: "t".to_string(),
                body: json!({ "currentPassword": "a", "newPassword": "b" }),
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            AdapterRejection(json!({ "message": "The consumer isn't authorized" }))
        );
    }

    #[tokio::test]
    async fn test_empty_error_body_reports_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/customers/me/orders")
            .with_status(503)
            .create_async()
            .await;

        let result = adapter(&server.url()).order_history("t").await;

        assert!(result.unwrap_err().to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_reset_password_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/customers/password")
            .match_body(Matcher::Json(json!({
                "email": "jane@example.com",
                "template": "email_reset",
                "websiteId": 1
            })))
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        let result = adapter(&server.url())
            .reset_password(PasswordResetRequest {
                email: "jane@example.com".to_string(),
                template: "email_reset".to_string(),
                website_id: 1,
            })
            .await;

        assert_eq!(result.unwrap(), Value::Bool(true));
        mock.assert_async().await;
    }
}
