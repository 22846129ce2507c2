use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Body of an envelope: the operation's result, or what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Data(Value),
    Errors(Value),
}

/// The uniform response shape: `{ "status", "data" | "errors", ...extra }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: StatusCode,
    pub payload: Payload,
    /// Route-specific side payloads, such as `refreshToken`.
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Envelope {
            status: StatusCode::OK,
            payload: Payload::Data(data),
            extra: Map::new(),
        }
    }

    pub fn failure(status: StatusCode, errors: Value) -> Self {
        Envelope {
            status,
            payload: Payload::Errors(errors),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.payload, Payload::Data(_))
    }

    /// Render as JSON. `status`, `data` and `errors` take precedence over
    /// extras of the same name.
    pub fn to_json(&self) -> Value {
        let mut body = self.extra.clone();
        body.insert("status".to_string(), Value::from(self.status.as_u16()));
        match &self.payload {
            Payload::Data(data) => body.insert("data".to_string(), data.clone()),
            Payload::Errors(errors) => body.insert("errors".to_string(), errors.clone()),
        };
        Value::Object(body)
    }
}

impl From<ApiError> for Envelope {
    fn from(err: ApiError) -> Self {
        Envelope::failure(err.status(), err.payload())
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(self.to_json())).into_response()
    }
}
