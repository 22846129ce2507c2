//! Failure taxonomy for the request pipeline.
//!
//! Every variant ends up in an error envelope; the status code and the
//! `errors` payload it carries are decided here.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::platforms::AdapterRejection;
use crate::schema::SchemaViolation;
use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The payload does not match the route's merged schema.
    #[error("payload failed schema validation ({} violation(s))", .0.len())]
    Validation(Vec<SchemaViolation>),
    /// A required field is missing or malformed.
    #[error("{0}")]
    InvalidField(String),
    /// No implementation is registered for the configured platform.
    #[error("{0}")]
    Configuration(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    /// The platform rejected the operation.
    #[error("platform rejected the request: {0}")]
    Adapter(#[from] AdapterRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidField(_) => StatusCode::BAD_REQUEST,
            ApiError::Token(TokenError::Missing) => StatusCode::BAD_REQUEST,
            ApiError::Token(TokenError::Invalid | TokenError::MissingAccessToken) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Token(TokenError::Encode(_))
            | ApiError::Configuration(_)
            | ApiError::Adapter(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The value placed under `errors` in the envelope. Platform rejections
    /// are passed through untouched.
    pub fn payload(&self) -> Value {
        match self {
            ApiError::Validation(violations) => {
                serde_json::to_value(violations).unwrap_or(Value::Null)
            }
            ApiError::Adapter(rejection) => rejection.0.clone(),
            other => Value::String(other.to_string()),
        }
    }

    /// Short name of the taxonomy bucket, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::InvalidField(_) => "validation",
            ApiError::Configuration(_) => "configuration",
            ApiError::Token(_) => "token",
            ApiError::Adapter(_) => "adapter",
        }
    }
}
