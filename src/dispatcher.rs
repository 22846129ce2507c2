//! Request dispatch: validate, resolve the platform adapter, invoke one
//! capability and wrap the outcome in an envelope.
//!
//! Pre-checks (schemas, required fields, tokens) run before an adapter is
//! resolved, so a rejected request never reaches the platform. Login and
//! refresh additionally mint a refresh token from the credentials they used.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ConfigV1;
use crate::error::ApiError;
use crate::models::Envelope;
use crate::platforms::{
    AuthorizedRequest, Domain, PasswordResetRequest, PlatformRegistry, RequestContext, UserAdapter,
};
use crate::schema::SchemaRegistry;
use crate::token::{self, Claims, TokenError};

const RESET_PASSWORD_TEMPLATE: &str = "email_reset";
const RESET_PASSWORD_WEBSITE_ID: u32 = 1;

/// Routes account operations to the configured platform.
pub struct Dispatcher {
    config: Arc<ConfigV1>,
    platforms: Arc<PlatformRegistry>,
    schemas: Arc<SchemaRegistry>,
}

impl Dispatcher {
    pub fn new(config: Arc<ConfigV1>, platforms: Arc<PlatformRegistry>, schemas: Arc<SchemaRegistry>) -> Self {
        Dispatcher {
            config,
            platforms,
            schemas,
        }
    }

    /// `POST /create`: validate against the registration schema, then `register`.
    pub async fn create(&self, context: RequestContext, body: Value) -> Envelope {
        finish("create", self.try_create(context, body).await)
    }

    /// `POST /login`: `login`, plus a refresh token minted from the credentials.
    pub async fn login(&self, context: RequestContext, body: Value) -> Envelope {
        finish("login", self.try_login(context, body).await)
    }

    /// `POST /refresh`: trade a refresh token for a new login and a new token.
    pub async fn refresh(&self, context: RequestContext, body: Value) -> Envelope {
        finish("refresh", self.try_refresh(context, body).await)
    }

    /// `POST /resetPassword`: `reset_password` for the given e-mail.
    pub async fn reset_password(&self, context: RequestContext, body: Value) -> Envelope {
        finish("reset_password", self.try_reset_password(context, body).await)
    }

    /// `GET /me`
    pub async fn me(&self, context: RequestContext, token: Option<String>) -> Envelope {
        finish("me", self.try_me(context, token).await)
    }

    /// `GET /order-history`
    pub async fn order_history(&self, context: RequestContext, token: Option<String>) -> Envelope {
        finish("order_history", self.try_order_history(context, token).await)
    }

    /// `POST /me`: validate against the profile schema, then `update`.
    pub async fn update(&self, context: RequestContext, token: Option<String>, body: Value) -> Envelope {
        finish("update", self.try_update(context, token, body).await)
    }

    /// `POST /changePassword`
    pub async fn change_password(
        &self,
        context: RequestContext,
        token: Option<String>,
        body: Value,
    ) -> Envelope {
        finish("change_password", self.try_change_password(context, token, body).await)
    }

    /// The platform id requests are dispatched to.
    pub fn platform(&self) -> &str {
        &self.config.platform
    }

    /// Whether the configured platform has an implementation.
    pub fn platform_available(&self) -> bool {
        self.platforms.contains(&self.config.platform)
    }

    fn adapter(&self, context: RequestContext) -> Result<Box<dyn UserAdapter>, ApiError> {
        self.platforms.get_adapter(&self.config.platform, Domain::User, context)
    }

    fn issue_refresh_token(&self, claims: &Claims) -> Result<String, TokenError> {
        token::encode_claims(claims, self.config.secrets.signing_secret())
    }

    async fn try_create(&self, context: RequestContext, body: Value) -> Result<Envelope, ApiError> {
        self.schemas
            .user_register
            .validate(&body)
            .map_err(ApiError::Validation)?;
        let data = self.adapter(context)?.register(body).await?;
        Ok(Envelope::success(data))
    }

    async fn try_login(&self, context: RequestContext, body: Value) -> Result<Envelope, ApiError> {
        let claims = body
            .as_object()
            .cloned()
            .ok_or_else(|| ApiError::InvalidField("Login credentials must be a JSON object".to_string()))?;
        let data = self.adapter(context)?.login(body).await?;
        let refresh_token = self.issue_refresh_token(&claims)?;
        Ok(Envelope::success(data).with_extra("refreshToken", refresh_token))
    }

    async fn try_refresh(&self, context: RequestContext, body: Value) -> Result<Envelope, ApiError> {
        let presented = body
            .get("refreshToken")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::Missing)?;
        let claims = token::decode_claims(presented, self.config.secrets.signing_secret())?;

        let data = self
            .adapter(context)?
            .login(Value::Object(claims.clone()))
            .await?;
        let refresh_token = self.issue_refresh_token(&claims)?;
        Ok(Envelope::success(data).with_extra("refreshToken", refresh_token))
    }

    async fn try_reset_password(&self, context: RequestContext, body: Value) -> Result<Envelope, ApiError> {
        let email = body
            .get("email")
            .and_then(Value::as_str)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| ApiError::InvalidField("Invalid e-mail provided!".to_string()))?;
        let request = PasswordResetRequest {
            email: email.to_string(),
            template: RESET_PASSWORD_TEMPLATE.to_string(),
            website_id: RESET_PASSWORD_WEBSITE_ID,
        };
        let data = self.adapter(context)?.reset_password(request).await?;
        Ok(Envelope::success(data))
    }

    async fn try_me(&self, context: RequestContext, token: Option<String>) -> Result<Envelope, ApiError> {
        let token = require_access_token(token)?;
        let data = self.adapter(context)?.me(&token).await?;
        Ok(Envelope::success(data))
    }

    async fn try_order_history(
        &self,
        context: RequestContext,
        token: Option<String>,
    ) -> Result<Envelope, ApiError> {
        let token = require_access_token(token)?;
        let data = self.adapter(context)?.order_history(&token).await?;
        Ok(Envelope::success(data))
    }

    async fn try_update(
        &self,
        context: RequestContext,
        token: Option<String>,
        body: Value,
    ) -> Result<Envelope, ApiError> {
        let token = require_access_token(token)?;
        self.schemas
            .user_profile
            .validate(&body)
            .map_err(ApiError::Validation)?;
        let data = self
            .adapter(context)?
            .update(AuthorizedRequest { token, body })
            .await?;
        Ok(Envelope::success(data))
    }

    async fn try_change_password(
        &self,
        context: RequestContext,
        token: Option<String>,
        body: Value,
    ) -> Result<Envelope, ApiError> {
        let token = require_access_token(token)?;
        let data = self
            .adapter(context)?
            .change_password(AuthorizedRequest { token, body })
            .await?;
        Ok(Envelope::success(data))
    }
}

fn require_access_token(token: Option<String>) -> Result<String, TokenError> {
    token
        .filter(|token| !token.is_empty())
        .ok_or(TokenError::MissingAccessToken)
}

fn finish(route: &'static str, result: Result<Envelope, ApiError>) -> Envelope {
    match result {
        Ok(envelope) => {
            debug!(event_name = "dispatch.success", route, "request served");
            envelope
        }
        Err(err) => {
            warn!(
                event_name = "dispatch.failure",
                route,
                error_kind = err.kind(),
                status = err.status().as_u16(),
                "request failed: {}",
                err
            );
            Envelope::from(err)
        }
    }
}
